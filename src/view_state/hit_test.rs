//! Pointer hit-testing results

/// Result of hit-testing a viewport Y coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTestResult {
    /// Point was outside the document.
    Miss,

    /// Point hit a paragraph.
    Hit {
        /// Index of the hit paragraph.
        paragraph: usize,
        /// Line within the paragraph, if its layout is cached.
        line: Option<usize>,
        /// Y offset below the paragraph top.
        local_y: f64,
    },
}

impl HitTestResult {
    /// Check if this was a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Get the paragraph index if hit.
    pub fn paragraph(&self) -> Option<usize> {
        match self {
            Self::Hit { paragraph, .. } => Some(*paragraph),
            Self::Miss => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_has_no_paragraph() {
        assert!(!HitTestResult::Miss.is_hit());
        assert_eq!(HitTestResult::Miss.paragraph(), None);
    }

    #[test]
    fn hit_reports_paragraph() {
        let hit = HitTestResult::Hit {
            paragraph: 7,
            line: Some(2),
            local_y: 45.0,
        };
        assert!(hit.is_hit());
        assert_eq!(hit.paragraph(), Some(7));
    }
}
