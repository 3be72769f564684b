/// Closed set of item categories.
///
/// The string form is the one used by the content files (`"numbers1-50"`,
/// `"capitalgreek"`, ...).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ItemCategory {
    #[strum(serialize = "numbers1-50")]
    #[cfg_attr(feature = "serde", serde(rename = "numbers1-50"))]
    NumbersLow,
    #[strum(serialize = "numbers51-100")]
    #[cfg_attr(feature = "serde", serde(rename = "numbers51-100"))]
    NumbersHigh,
    #[strum(serialize = "sets")]
    #[cfg_attr(feature = "serde", serde(rename = "sets"))]
    Sets,
    #[strum(serialize = "constants")]
    #[cfg_attr(feature = "serde", serde(rename = "constants"))]
    Constants,
    #[strum(serialize = "functions")]
    #[cfg_attr(feature = "serde", serde(rename = "functions"))]
    Functions,
    #[strum(serialize = "theorems")]
    #[cfg_attr(feature = "serde", serde(rename = "theorems"))]
    Theorems,
    #[strum(serialize = "symbols")]
    #[cfg_attr(feature = "serde", serde(rename = "symbols"))]
    Symbols,
    #[strum(serialize = "capitalgreek")]
    #[cfg_attr(feature = "serde", serde(rename = "capitalgreek"))]
    CapitalGreek,
    #[strum(serialize = "smallgreek")]
    #[cfg_attr(feature = "serde", serde(rename = "smallgreek"))]
    SmallGreek,
    #[strum(serialize = "sequence")]
    #[cfg_attr(feature = "serde", serde(rename = "sequence"))]
    Sequence,
}

/// Coarser grouping offered to players when filtering their inventory.
///
/// Numbers and greek letters are each split over two categories in the
/// catalog but presented as one group.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CategoryGroup {
    #[default]
    All,
    Numbers,
    Sets,
    Constants,
    Functions,
    Theorems,
    Symbols,
    Greek,
    Sequences,
}

impl CategoryGroup {
    /// Returns true if items of `category` belong to this group.
    pub fn contains(self, category: ItemCategory) -> bool {
        use ItemCategory as C;

        match self {
            Self::All => true,
            Self::Numbers => matches!(category, C::NumbersLow | C::NumbersHigh),
            Self::Sets => category == C::Sets,
            Self::Constants => category == C::Constants,
            Self::Functions => category == C::Functions,
            Self::Theorems => category == C::Theorems,
            Self::Symbols => category == C::Symbols,
            Self::Greek => matches!(category, C::CapitalGreek | C::SmallGreek),
            Self::Sequences => category == C::Sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn category_strings_round_trip() {
        for category in ItemCategory::iter() {
            let parsed = ItemCategory::from_str(category.as_ref()).unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(ItemCategory::NumbersLow.to_string(), "numbers1-50");
        assert_eq!(
            ItemCategory::from_str("CapitalGreek").unwrap(),
            ItemCategory::CapitalGreek
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(ItemCategory::from_str("animals").is_err());
    }

    #[test]
    fn every_category_has_exactly_one_group_besides_all() {
        for category in ItemCategory::iter() {
            let groups: Vec<_> = CategoryGroup::iter()
                .filter(|g| *g != CategoryGroup::All && g.contains(category))
                .collect();
            assert_eq!(groups.len(), 1, "{category} in {groups:?}");
            assert!(CategoryGroup::All.contains(category));
        }
    }
}
