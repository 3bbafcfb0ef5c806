use crate::rows::DisplayRow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Sentinel option meaning "no constraint".
pub const ANY_OPTION: &str = "__any__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Winner,
    Instance,
}

impl OptionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionField::Winner => "winner",
            OptionField::Instance => "instance",
        }
    }

    fn value<'a>(&self, row: &'a DisplayRow) -> &'a str {
        match self {
            OptionField::Winner => &row.winner,
            OptionField::Instance => &row.instance,
        }
    }
}

impl fmt::Display for OptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionField {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "winner" | "winners" => Ok(OptionField::Winner),
            "instance" | "instances" => Ok(OptionField::Instance),
            other => Err(format!("Unknown option field: {other}")),
        }
    }
}

/// Distinct non-empty values of `field`, sorted, with [`ANY_OPTION`] first.
pub fn build_options(rows: &[DisplayRow], field: OptionField) -> Vec<String> {
    let distinct: BTreeSet<&str> = rows
        .iter()
        .map(|row| field.value(row))
        .filter(|value| !value.is_empty())
        .collect();

    let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    values.sort_by(|a, b| collate(a, b));
    values.insert(0, ANY_OPTION.to_string());
    values
}

/// Keep `previous` when it is still offered, otherwise fall back to the
/// sentinel.
pub fn retain_selection(options: &[String], previous: &str) -> String {
    if options.iter().any(|option| option == previous) {
        previous.to_string()
    } else {
        ANY_OPTION.to_string()
    }
}

pub fn is_any(value: &str) -> bool {
    value.is_empty() || value == ANY_OPTION
}

/// Human label for an option value.
pub fn option_label(value: &str) -> &str {
    if is_any(value) {
        "all"
    } else {
        value
    }
}

/// Case- and accent-insensitive ordering, byte order as tie-break.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(winners: &[&str]) -> Vec<DisplayRow> {
        winners
            .iter()
            .map(|winner| DisplayRow {
                winner: winner.to_string(),
                instance: format!("{winner}-inst"),
                ..DisplayRow::default()
            })
            .collect()
    }

    #[test]
    fn options_are_distinct_sorted_with_sentinel() {
        let options = build_options(&rows(&["bob", "Alice", "", "Élise", "Bob", "alice"]), OptionField::Winner);
        assert_eq!(options, vec![ANY_OPTION, "Alice", "alice", "Bob", "bob", "Élise"]);
    }

    #[test]
    fn instance_options_read_instance_column() {
        let options = build_options(&rows(&["Zed"]), OptionField::Instance);
        assert_eq!(options, vec![ANY_OPTION, "Zed-inst"]);
    }

    #[test]
    fn selection_survives_only_when_still_offered() {
        let options = build_options(&rows(&["Alice", "Bob"]), OptionField::Winner);
        assert_eq!(retain_selection(&options, "Bob"), "Bob");
        assert_eq!(retain_selection(&options, "Carol"), ANY_OPTION);
        assert_eq!(retain_selection(&options, ANY_OPTION), ANY_OPTION);
    }

    #[test]
    fn extended_latin_sorts_with_its_base_letter() {
        let options = build_options(&rows(&["Tomas", "Łukasz", "Šimon", "Zoltán", "Lars"]), OptionField::Winner);
        assert_eq!(options, vec![ANY_OPTION, "Lars", "Łukasz", "Šimon", "Tomas", "Zoltán"]);
        assert_eq!(collate("Ődön", "Otto"), Ordering::Less);
    }

    #[test]
    fn parses_field_names() {
        assert_eq!("winners".parse::<OptionField>(), Ok(OptionField::Winner));
        assert_eq!("Instance".parse::<OptionField>(), Ok(OptionField::Instance));
        assert!("boss".parse::<OptionField>().is_err());
    }
}
