//! Fixed content shipped with the server: category answer banks, arithmetic
//! questions and the random drawing word list.

use std::{collections::HashSet, fmt, sync::LazyLock};

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::text::normalize;

/// Identifier of one category in the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    /// Animal names.
    Animals,
    /// Fruit names.
    Fruits,
    /// Arithmetic questions answered with a number.
    Math,
}

/// Static description of a category shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryInfo {
    /// Stable identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: &'static str,
    /// Decorative icon.
    pub icon: &'static str,
}

/// Categories played, in order, by every category race.
pub const CATEGORIES: [CategoryInfo; 3] = [
    CategoryInfo {
        id: CategoryId::Animals,
        name: "حيوانات",
        icon: "🐱",
    },
    CategoryInfo {
        id: CategoryId::Fruits,
        name: "فواكه",
        icon: "🍎",
    },
    CategoryInfo {
        id: CategoryId::Math,
        name: "عمليات حسابية",
        icon: "➗",
    },
];

const ANIMALS: &[&str] = &[
    "قط", "قطة", "كلب", "أسد", "فيل", "نمر", "دب", "ذئب", "ثعلب", "أرنب", "غزال", "زرافة",
    "حمار", "حصان", "جمل", "بقرة", "خروف", "ماعز", "دجاجة", "بطة", "إوزة", "نسر", "صقر",
    "حمامة", "عصفور", "ببغاء", "سمكة", "قرش", "حوت", "دولفين", "أخطبوط", "فأر", "قنفذ",
    "سلحفاة", "ثعبان", "تمساح", "ضفدع", "نحلة", "نملة", "فراشة", "عنكبوت", "خفاش", "كنغر",
    "باندا", "قرد", "غوريلا", "فهد", "ضبع", "وحيد القرن", "فرس النهر", "دودة",
];

const FRUITS: &[&str] = &[
    "تفاح", "موز", "برتقال", "عنب", "فراولة", "مانجو", "أناناس", "بطيخ", "شمام", "خوخ",
    "كمثرى", "ليمون", "رمان", "كيوي", "تين", "توت", "مشمش", "جوافة", "باباي", "تمر", "كرز",
    "بلح", "يوسفي", "جريب فروت", "دراق", "نكتارين", "جوز الهند", "أفوكادو", "تنين",
    "باشن فروت", "ليتشي", "رامبوتان", "كاكا", "كمكوات", "بلوبيري", "راسبيري", "بلاك بيري",
    "فريز", "سفرجل", "نبق", "عناب", "دوم", "بوملي", "يد بوذا", "اكي", "كورسول", "دوريان",
    "مانجوستين", "لونجان",
];

/// Word list used when a drawing game runs in random word mode.
pub const RANDOM_WORDS: &[&str] = &[
    "سيارة", "شجرة", "قطة", "كلب", "بيت", "شمس", "قمر", "نجمة", "زهرة", "سمكة", "طائرة",
    "قارب", "دراجة", "كرة", "كتاب", "قلم", "كوب", "طاولة", "كرسي", "باب", "شباك", "ساعة",
    "هاتف", "حاسوب", "تلفاز", "نظارة", "قبعة", "حذاء", "قميص", "سروال", "فراشة", "نحلة",
    "عصفور", "أرنب", "فيل", "أسد", "نمر", "دب", "ثعلب", "غزال", "تفاح", "موز", "برتقال",
    "عنب", "بطيخ", "جبل", "نهر", "بحر", "سحابة", "مطر",
];

static ANIMAL_BANK: LazyLock<HashSet<String>> = LazyLock::new(|| normalized_bank(ANIMALS));
static FRUIT_BANK: LazyLock<HashSet<String>> = LazyLock::new(|| normalized_bank(FRUITS));

fn normalized_bank(words: &[&str]) -> HashSet<String> {
    words.iter().map(|word| normalize(word)).collect()
}

impl CategoryId {
    /// Normalized answer bank for word categories; `None` for arithmetic.
    pub fn answer_bank(self) -> Option<&'static HashSet<String>> {
        match self {
            CategoryId::Animals => Some(&ANIMAL_BANK),
            CategoryId::Fruits => Some(&FRUIT_BANK),
            CategoryId::Math => None,
        }
    }
}

/// Arithmetic operator of a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    /// Addition.
    Add,
    /// Subtraction, never negative.
    Sub,
    /// Multiplication.
    Mul,
    /// Integral division.
    Div,
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            MathOp::Add => "+",
            MathOp::Sub => "-",
            MathOp::Mul => "×",
            MathOp::Div => "÷",
        };
        f.write_str(symbol)
    }
}

/// Arithmetic question with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathQuestion {
    /// Left operand.
    pub left: u32,
    /// Right operand.
    pub right: u32,
    /// Operator.
    pub op: MathOp,
    /// Expected result.
    pub answer: u32,
}

impl MathQuestion {
    /// Draw a random question whose result is a non-negative integer.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let op = match rng.random_range(0..4) {
            0 => MathOp::Add,
            1 => MathOp::Sub,
            2 => MathOp::Mul,
            _ => MathOp::Div,
        };

        let (left, right, answer) = match op {
            MathOp::Add => {
                let left = rng.random_range(1..=50);
                let right = rng.random_range(1..=50);
                (left, right, left + right)
            }
            MathOp::Sub => {
                let left = rng.random_range(20..=69);
                let right = rng.random_range(1..=left);
                (left, right, left - right)
            }
            MathOp::Mul => {
                let left = rng.random_range(1..=12);
                let right = rng.random_range(1..=12);
                (left, right, left * right)
            }
            MathOp::Div => {
                let right = rng.random_range(2..=11);
                let answer = rng.random_range(1..=10);
                (right * answer, right, answer)
            }
        };

        Self {
            left,
            right,
            op,
            answer,
        }
    }

    /// Whether `value` matches the expected answer within 0.01.
    pub fn accepts(&self, value: f64) -> bool {
        (value - f64::from(self.answer)).abs() < 0.01
    }

    /// Text shown to players, without the answer.
    pub fn prompt(&self) -> String {
        format!("{} {} {}", self.left, self.op, self.right)
    }
}

/// Pick `count` distinct words from [`RANDOM_WORDS`].
pub fn random_drawing_words<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    RANDOM_WORDS
        .choose_multiple(rng, count)
        .map(|word| (*word).to_string())
        .collect()
}
