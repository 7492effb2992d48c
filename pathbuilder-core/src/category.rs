//! Activity categories and the ordered rule table that assigns them.
//!
//! Every feature (skill or ability) of an occupation falls into exactly one
//! [`Category`]. Physical, creative and social activity is presumed to resist
//! automation, routine activity to invite it, and everything else is
//! [`Category::Other`], which the job risk engine ignores when measuring a
//! job's PCS composition.
//!
//! # Examples
//! ```
//! use pathbuilder_core::{Category, CategoryClassifier, RuleClassifier};
//!
//! let classifier = RuleClassifier::default();
//! assert_eq!(classifier.category_for("Manual Dexterity"), Category::Physical);
//! assert_eq!(classifier.category_for("Programming"), Category::Other);
//! ```

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Activity category of a single job feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Repetitive monitoring, ordering and checking work.
    Routine,
    /// Dexterity, strength, perception and motor control.
    Physical,
    /// Ideation and design.
    Creative,
    /// Communication, coordination and persuasion.
    Social,
    /// Anything the rule table does not recognise.
    Other,
}

impl Category {
    /// Return the category as an uppercase label.
    ///
    /// # Examples
    /// ```
    /// use pathbuilder_core::Category;
    ///
    /// assert_eq!(Category::Social.as_str(), "SOCIAL");
    /// ```
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "ROUTINE",
            Self::Physical => "PHYSICAL",
            Self::Creative => "CREATIVE",
            Self::Social => "SOCIAL",
            Self::Other => "OTHER",
        }
    }

    /// Report whether the category counts toward a job's PCS mass.
    pub const fn is_pcs(self) -> bool {
        matches!(self, Self::Physical | Self::Creative | Self::Social)
    }

    /// Report whether the category counts toward the PCS denominator.
    ///
    /// This is the PCS categories plus [`Category::Routine`].
    pub const fn is_measured(self) -> bool {
        self.is_pcs() || matches!(self, Self::Routine)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ROUTINE" => Ok(Self::Routine),
            "PHYSICAL" => Ok(Self::Physical),
            "CREATIVE" => Ok(Self::Creative),
            "SOCIAL" => Ok(Self::Social),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("unknown category '{s}'")),
        }
    }
}

/// Assign a [`Category`] to a feature's display name.
///
/// Implementations must be total: every input, including the empty string,
/// maps to exactly one category. Implementations must be thread-safe so a
/// classifier can be shared between scoring runs.
pub trait CategoryClassifier: Send + Sync {
    /// Return the category for `feature_name`.
    fn category_for(&self, feature_name: &str) -> Category;
}

/// Errors raised while building a [`RuleClassifier`].
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A rule was declared without any names to match.
    #[error("rule for {category} must list at least one name")]
    EmptyRule {
        /// Category of the offending rule.
        category: Category,
    },
    /// A rule's alternation could not be compiled.
    #[error("failed to compile pattern for {category}")]
    Pattern {
        /// Category of the offending rule.
        category: Category,
        /// Source error from `regex`.
        #[source]
        source: regex::Error,
    },
}

/// One entry of the ordered decision table.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pattern: Regex,
    category: Category,
}

impl CategoryRule {
    /// Build a rule matching any of `names` as whole words, ignoring case.
    ///
    /// Names are matched literally; regex metacharacters are escaped.
    ///
    /// # Errors
    /// Returns [`ClassifierError::EmptyRule`] when `names` is empty and
    /// [`ClassifierError::Pattern`] when the alternation exceeds the regex
    /// engine's limits.
    pub fn new<I, S>(category: Category, names: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = names
            .into_iter()
            .map(|name| regex::escape(name.as_ref().trim()))
            .filter(|name| !name.is_empty())
            .collect();
        if alternatives.is_empty() {
            return Err(ClassifierError::EmptyRule { category });
        }
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|source| ClassifierError::Pattern { category, source })?;
        Ok(Self { pattern, category })
    }

    /// Category assigned when this rule matches.
    pub const fn category(&self) -> Category {
        self.category
    }

    fn matches(&self, feature_name: &str) -> bool {
        self.pattern.is_match(feature_name)
    }
}

/// Ordered rule table: the first matching rule wins, otherwise
/// [`Category::Other`].
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Vec<CategoryRule>,
}

impl RuleClassifier {
    /// Build a classifier from rules evaluated in the given order.
    pub const fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Build a classifier from `(category, names)` declarations.
    ///
    /// # Errors
    /// Propagates [`ClassifierError`] from [`CategoryRule::new`].
    pub fn from_declarations<'a, I>(declarations: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (Category, &'a [&'a str])>,
    {
        let rules = declarations
            .into_iter()
            .map(|(category, names)| CategoryRule::new(category, names.iter().copied()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Return the standard occupational skill and ability taxonomy.
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        STANDARD.clone()
    }
}

impl CategoryClassifier for RuleClassifier {
    fn category_for(&self, feature_name: &str) -> Category {
        self.rules
            .iter()
            .find(|rule| rule.matches(feature_name))
            .map_or(Category::Other, CategoryRule::category)
    }
}

const ROUTINE_NAMES: &[&str] = &[
    "Operation Monitoring of Machinery and Equipment",
    "Quality Control Testing",
    "Monitoring",
    "Categorization Flexibility",
    "Numeracy",
    "Information Ordering",
    "Pattern Identification",
    "Pattern Organization Speed",
];

const PHYSICAL_NAMES: &[&str] = &[
    "Repairing",
    "Setting up",
    "Memorizing",
    "Multitasking",
    "Perceptual Speed",
    "Selective Attention",
    "Spatial Orientation",
    "Spatial Visualization",
    "Verbal Ability",
    "Body Flexibility",
    "Dynamic Strength",
    "Explosive Strength",
    "Gross Body Coordination",
    "Gross Body Equilibrium",
    "Multi-Limb Coordination",
    "Stamina",
    "Static Strength",
    "Trunk Strength",
    "Arm-Hand Steadiness",
    "Control of Settings",
    "Finger Dexterity",
    "Manual Dexterity",
    "Multi-Signal Response",
    "Rate Control",
    "Reaction Time",
    "Speed of Limb Movement",
    "Finger-Hand-Wrist Motion",
    "Auditory Attention",
    "Depth Perception",
    "Far Vision",
    "Glare Tolerance",
    "Hearing Sensitivity",
    "Near Vision",
    "Night Vision",
    "Peripheral Vision",
    "Speech Clarity",
    "Speech Recognition",
    "Sound Localization",
    "Colour Perception",
];

const CREATIVE_NAMES: &[&str] = &["Fluency of Ideas", "Product Design"];

const SOCIAL_NAMES: &[&str] = &[
    "Oral Communication: Active Listening",
    "Oral Communication: Oral Comprehension",
    "Oral Communication: Oral Expression",
    "Coordinating",
    "Instructing",
    "Negotiating",
    "Persuading",
    "Social Perceptiveness",
];

static STANDARD: LazyLock<RuleClassifier> = LazyLock::new(|| {
    RuleClassifier::from_declarations([
        (Category::Routine, ROUTINE_NAMES),
        (Category::Physical, PHYSICAL_NAMES),
        (Category::Creative, CREATIVE_NAMES),
        (Category::Social, SOCIAL_NAMES),
    ])
    .expect("standard category names are escaped literals")
});
