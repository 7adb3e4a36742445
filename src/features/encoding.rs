/// Maps string labels to dense integer codes in sorted label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fits on every label yielded; duplicates collapse to one class.
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(str::to_owned).collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code of `label`, or `None` if it was not seen during fit.
    pub fn transform(&self, label: &str) -> Option<i32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
            .map(|i| i as i32)
    }

    pub fn inverse_transform(&self, code: i32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let enc = LabelEncoder::fit(["B738", "A320", "B738", "A21N"]);
        assert_eq!(enc.classes(), &["A21N", "A320", "B738"]);
        assert_eq!(enc.transform("A21N"), Some(0));
        assert_eq!(enc.transform("B738"), Some(2));
        assert_eq!(enc.transform("E190"), None);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let labels = ["M", "H", "L", "H"];
        let enc = LabelEncoder::fit(labels);
        for label in labels {
            let code = enc.transform(label).unwrap();
            assert_eq!(enc.inverse_transform(code), Some(label));
        }
        assert_eq!(enc.inverse_transform(-1), None);
        assert_eq!(enc.inverse_transform(3), None);
    }
}
