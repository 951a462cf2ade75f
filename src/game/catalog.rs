use std::fmt;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 一张待猜的物品卡：答案标题与图片资源路径。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectCard {
    pub title: String,
    #[serde(alias = "img", alias = "imageRef")]
    pub image_ref: String,
}

impl ObjectCard {
    pub fn new(title: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image_ref: image_ref.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CatalogError {
    Empty,
    BlankTitle { index: usize },
    BlankImageRef { index: usize },
    Malformed { message: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "catalog must contain at least one card"),
            CatalogError::BlankTitle { index } => write!(f, "card {index} has a blank title"),
            CatalogError::BlankImageRef { index } => {
                write!(f, "card {index} has a blank image reference")
            }
            CatalogError::Malformed { message } => write!(f, "malformed catalog: {message}"),
        }
    }
}

impl std::error::Error for CatalogError {}

const BUILTIN_CARDS: [(&str, &str); 20] = [
    ("Banana", "/yellow-banana-fruit.png"),
    ("Mug", "/white-coffee-mug-with-steam.png"),
    ("Bicycle", "/bicycle.jpg"),
    ("Pizza", "/delicious-toppings-pizza.png"),
    ("Guitar", "/acoustic-guitar-musical-instrument.png"),
    ("Sunflower", "/bright-yellow-sunflower.png"),
    ("Airplane", "/airplane.jpg"),
    ("Airpod", "/airpod.jpg"),
    ("Cake", "/cake.jpg"),
    ("Chair", "/chair.jpg"),
    ("Glasses", "/eye-glass.jpg"),
    ("Fan", "/fan.jpg"),
    ("Football", "/football.jpg"),
    ("Keyboard", "/Keyboard.jpg"),
    ("Ladder", "/ladder.jpg"),
    ("Laptop", "/laptop.jpg"),
    ("Mouse", "/mouse.jpg"),
    ("Train", "/train.jpg"),
    ("Speaker", "/speaker.jpg"),
    ("Car", "/car.jpg"),
];

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog {
    cards: BUILTIN_CARDS
        .iter()
        .map(|(title, image_ref)| ObjectCard::new(*title, *image_ref))
        .collect(),
});

/// 只读的物品目录。构造时校验，因此永远非空。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    cards: Vec<ObjectCard>,
}

impl Catalog {
    pub fn new(cards: Vec<ObjectCard>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, card) in cards.iter().enumerate() {
            if card.title.trim().is_empty() {
                return Err(CatalogError::BlankTitle { index });
            }
            if card.image_ref.trim().is_empty() {
                return Err(CatalogError::BlankImageRef { index });
            }
        }
        Ok(Self { cards })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let cards: Vec<ObjectCard> =
            serde_json::from_str(json).map_err(|err| CatalogError::Malformed {
                message: err.to_string(),
            })?;
        Self::new(cards)
    }

    pub fn builtin() -> Self {
        (*BUILTIN).clone()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// 构造时已保证非空，恒为 false。
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[ObjectCard] {
        &self.cards
    }

    /// Fisher–Yates 洗牌后的完整副本。
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ObjectCard> {
        let mut order = self.cards.clone();
        order.shuffle(rng);
        order
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let cards = Vec::<ObjectCard>::deserialize(deserializer)?;
        Catalog::new(cards).map_err(serde::de::Error::custom)
    }
}
