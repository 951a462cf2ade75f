//! Property tests: random sequences of player actions, clock ticks and timer
//! firings must keep the engine's bookkeeping consistent.

use proptest::prelude::*;

use secret_object_game::game::{
    Catalog, GameEvent, GamePhase, ObjectCard, RuleEngine, Team, Verdict, MAX_ROUNDS,
    SETTLE_DELAY_MS, TURN_DURATION_SECS,
};

#[derive(Debug, Clone, Copy)]
enum Step {
    Answer(Verdict),
    Tick,
    Wait(u64),
    Reset,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Answer(Verdict::Correct)),
        2 => Just(Step::Answer(Verdict::Incorrect)),
        1 => Just(Step::Answer(Verdict::Skipped)),
        4 => Just(Step::Tick),
        4 => (0u64..=SETTLE_DELAY_MS * 2).prop_map(Step::Wait),
        1 => Just(Step::Reset),
    ]
}

fn catalog_of(size: usize) -> Catalog {
    let cards = (0..size)
        .map(|i| ObjectCard::new(format!("Object {i}"), format!("/object-{i}.png")))
        .collect();
    Catalog::new(cards).unwrap()
}

fn sorted_titles(cards: &[ObjectCard]) -> Vec<String> {
    let mut titles: Vec<String> = cards.iter().map(|card| card.title.clone()).collect();
    titles.sort();
    titles
}

proptest! {
    #[test]
    fn bookkeeping_stays_consistent(
        size in 1usize..=25,
        seed in any::<u64>(),
        steps in prop::collection::vec(step(), 1..300),
    ) {
        let catalog = catalog_of(size);
        let catalog_titles = sorted_titles(catalog.cards());
        let mut engine = RuleEngine::with_seed(catalog, seed);

        let mut awarded_calls = 0u32;
        let mut completed_turns = 0usize;

        for step in steps {
            let before = engine.state().clone();
            let events = match step {
                Step::Answer(verdict) => {
                    if verdict.awards_point() {
                        awarded_calls += 1;
                    }
                    engine.answer(verdict)
                }
                Step::Tick => engine.tick(),
                Step::Wait(ms) => engine.advance_time(ms),
                Step::Reset => {
                    awarded_calls = 0;
                    completed_turns = 0;
                    engine.reset()
                }
            };
            let state = engine.state();

            prop_assert!(state.integrity_check().is_ok());

            if matches!(step, Step::Reset) {
                prop_assert_eq!(state.phase, GamePhase::Playing);
                prop_assert_eq!((state.score_a, state.score_b), (0, 0));
                prop_assert_eq!(state.current_round, 1);
                prop_assert_eq!(state.cursor, 0);
                prop_assert_eq!(state.countdown, TURN_DURATION_SECS);
                prop_assert!(!state.transitioning && !state.celebrate);
                prop_assert_eq!(sorted_titles(&state.play_order), catalog_titles.clone());
                prop_assert_eq!(engine.pending_tasks(), 0);
                continue;
            }

            // 被锁定或已结束时，输入不改变任何状态。
            if !before.accepts_input() && matches!(step, Step::Answer(_) | Step::Tick) {
                prop_assert!(events.is_empty());
                prop_assert_eq!(&before, state);
            }

            prop_assert!(state.score_a >= before.score_a);
            prop_assert!(state.score_b >= before.score_b);
            prop_assert!(state.score_a + state.score_b <= awarded_calls);
            prop_assert_eq!(&state.play_order, &before.play_order);

            completed_turns += events
                .iter()
                .filter(|event| {
                    matches!(event, GameEvent::TurnStarted { .. } | GameEvent::GameFinished { .. })
                })
                .count();

            prop_assert_eq!(state.cursor, completed_turns % size);
            prop_assert_eq!(state.current_round as usize, 1 + completed_turns / 2);
            let expected_team = if completed_turns % 2 == 0 { Team::A } else { Team::B };
            prop_assert_eq!(state.current_team, expected_team);
            prop_assert_eq!(
                state.phase == GamePhase::Finished,
                completed_turns == (MAX_ROUNDS * 2) as usize
            );
        }
    }

    #[test]
    fn timeout_equals_explicit_no_from_any_countdown(
        seed in any::<u64>(),
        ticks in 0u32..=TURN_DURATION_SECS,
        correct_turns in 0u32..6,
    ) {
        let mut timed_out = RuleEngine::with_seed(Catalog::builtin(), seed);
        for _ in 0..correct_turns {
            timed_out.advance_turn(true);
            timed_out.advance_time(SETTLE_DELAY_MS);
        }
        for _ in 0..ticks {
            timed_out.tick();
        }
        let mut declined = RuleEngine::with_seed(Catalog::builtin(), seed);
        for _ in 0..correct_turns {
            declined.advance_turn(true);
            declined.advance_time(SETTLE_DELAY_MS);
        }

        // 先把倒计时耗尽，再分别以超时与主动放弃结束回合。
        for _ in ticks..TURN_DURATION_SECS {
            timed_out.tick();
        }
        for _ in 0..TURN_DURATION_SECS {
            declined.tick();
        }
        prop_assert_eq!(timed_out.state().countdown, 0);

        timed_out.tick();
        declined.advance_turn(false);
        prop_assert_eq!(timed_out.state(), declined.state());

        timed_out.advance_time(SETTLE_DELAY_MS);
        declined.advance_time(SETTLE_DELAY_MS);
        prop_assert_eq!(timed_out.state(), declined.state());
    }
}
