use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The fixed spending categories a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Utilities,
    Auto,
    Meal,
    Travel,
    Insurance,
    Office,
    Purchases,
    Shipping,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Utilities,
        Category::Auto,
        Category::Meal,
        Category::Travel,
        Category::Insurance,
        Category::Office,
        Category::Purchases,
        Category::Shipping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Utilities => "utilities",
            Category::Auto => "auto",
            Category::Meal => "meal",
            Category::Travel => "travel",
            Category::Insurance => "insurance",
            Category::Office => "office",
            Category::Purchases => "purchases",
            Category::Shipping => "shipping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown category: '{}'", s.trim()))
    }
}

/// Aggregation key: a real category, or the display-only "uncategorized" bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryBucket {
    Category(Category),
    Uncategorized,
}

impl CategoryBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryBucket::Category(c) => c.as_str(),
            CategoryBucket::Uncategorized => "uncategorized",
        }
    }
}

impl From<Option<Category>> for CategoryBucket {
    fn from(category: Option<Category>) -> Self {
        category.map_or(CategoryBucket::Uncategorized, CategoryBucket::Category)
    }
}

impl fmt::Display for CategoryBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as a bare string so bucket-keyed maps become JSON objects.
impl Serialize for CategoryBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
