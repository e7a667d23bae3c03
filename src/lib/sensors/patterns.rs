use regex::{Captures, Regex};

/// Turns the captures of one matched layout into a value, `None` if they do not parse
pub type Extractor<T> = fn(&Captures) -> Option<T>;

struct Pattern<T> {
    regex: Regex,
    extract: Extractor<T>,
}

/// Alternative text layouts of the same value, tried in order.
///
/// Device tools print the same information differently depending on the vendor
/// and OS build.
pub struct OrderedPatterns<T> {
    patterns: Vec<Pattern<T>>,
}

impl<T> OrderedPatterns<T> {
    pub fn new(patterns: &[(&str, Extractor<T>)]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|&(pattern, extract)| {
                Ok(Pattern {
                    regex: Regex::new(pattern)?,
                    extract,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { patterns })
    }

    /// Value of the first layout whose first match in `text` extracts successfully
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .regex
                .captures(text)
                .and_then(|captures| (pattern.extract)(&captures))
        })
    }
}

/// Capture group `group` as a finite float
pub fn number(captures: &Captures, group: usize) -> Option<f64> {
    captures
        .get(group)?
        .as_str()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn first_number(captures: &Captures) -> Option<f64> {
    number(captures, 1)
}
