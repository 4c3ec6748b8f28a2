//! Admission rules for user-supplied images.
//!
//! Candidates are checked one by one in submission order and the first
//! failure rejects the entire batch; the staged set only ever grows by a
//! whole batch.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::StagedFile;

pub const MIB: u64 = 1024 * 1024;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * MIB;
pub const DEFAULT_MAX_FILE_COUNT: usize = 5;
pub const DEFAULT_ACCEPT: &str = "image/*";

/// An HTML `accept`-style list: exact MIME types, `type/*` wildcards, `*/*`, or `.ext` suffixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptPattern {
    raw: String,
    entries: Vec<String>,
}

impl AcceptPattern {
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(|entry| entry.trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();

        Self {
            raw: raw.trim().to_string(),
            entries,
        }
    }

    /// Does a file with this declared type (and name) satisfy the pattern?
    pub fn matches(&self, mime_type: &str, filename: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }

        // Drop parameters such as "; charset=binary"
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let filename = filename.to_ascii_lowercase();

        self.entries.iter().any(|entry| {
            if entry == "*" || entry == "*/*" {
                true
            } else if entry.starts_with('.') {
                filename.ends_with(entry.as_str())
            } else if let Some(major) = entry.strip_suffix("/*") {
                mime.split_once('/').is_some_and(|(m, _)| m == major)
            } else {
                *entry == mime
            }
        })
    }
}

impl Default for AcceptPattern {
    fn default() -> Self {
        Self::parse(DEFAULT_ACCEPT)
    }
}

impl FromStr for AcceptPattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for AcceptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub max_file_size_bytes: u64,
    pub max_file_count: usize,
    pub accepted_types: AcceptPattern,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            accepted_types: AcceptPattern::default(),
        }
    }
}

/// Ordered set of files admitted for upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedFiles {
    files: Vec<StagedFile>,
}

impl StagedFiles {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter()
    }

    pub fn get(&self, index: usize) -> Option<&StagedFile> {
        self.files.get(index)
    }

    pub fn as_slice(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(StagedFile::size).sum()
    }

    /// Stable removal; the remaining files keep their relative order.
    pub fn remove(&mut self, index: usize) -> Result<StagedFile, ValidationError> {
        if index >= self.files.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        Ok(self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    config: ValidatorConfig,
}

impl InputValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Size and type checks for a single candidate
    pub fn check_file(&self, file: &StagedFile) -> Result<(), ValidationError> {
        if file.size() > self.config.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                filename: file.filename().to_string(),
                size: file.size(),
                limit: self.config.max_file_size_bytes,
            });
        }

        if !self.config.accepted_types.matches(file.mime_type(), file.filename()) {
            return Err(ValidationError::UnsupportedType {
                filename: file.filename().to_string(),
                mime_type: file.mime_type().to_string(),
                accepted: self.config.accepted_types.to_string(),
            });
        }

        Ok(())
    }

    /// Admit a batch into `staged`, all or nothing. Returns the number of files added.
    pub fn admit(
        &self,
        staged: &mut StagedFiles,
        candidates: Vec<StagedFile>,
    ) -> Result<usize, ValidationError> {
        for file in &candidates {
            self.check_file(file)?;
        }

        let attempted = staged.len() + candidates.len();
        if attempted > self.config.max_file_count {
            return Err(ValidationError::TooManyFiles {
                max: self.config.max_file_count,
                attempted,
            });
        }

        let added = candidates.len();
        staged.files.extend(candidates);
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: usize) -> StagedFile {
        StagedFile::new(name, "image/png", vec![0u8; size])
    }

    fn names(staged: &StagedFiles) -> Vec<&str> {
        staged.iter().map(StagedFile::filename).collect()
    }

    #[test]
    fn test_accept_pattern() {
        let any_image = AcceptPattern::parse("image/*");
        assert!(any_image.matches("image/png", "a.png"));
        assert!(any_image.matches("IMAGE/JPEG; q=1", "a.jpg"));
        assert!(!any_image.matches("application/pdf", "a.pdf"));
        assert!(!any_image.matches("imagex/png", "a.png"));

        let list = AcceptPattern::parse("image/png, .webp");
        assert!(list.matches("image/png", "a.png"));
        assert!(list.matches("application/octet-stream", "Photo.WEBP"));
        assert!(!list.matches("image/jpeg", "a.jpg"));

        assert!(AcceptPattern::parse("").matches("text/plain", "a.txt"));
        assert!(AcceptPattern::parse("*/*").matches("text/plain", "a.txt"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let validator = InputValidator::new(ValidatorConfig {
            max_file_size_bytes: 100,
            ..Default::default()
        });
        let mut staged = StagedFiles::default();
        validator.admit(&mut staged, vec![png("ok.png", 10)]).unwrap();

        let err = validator.admit(&mut staged, vec![png("big.png", 101)]).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { size: 101, limit: 100, .. }));
        assert_eq!(names(&staged), vec!["ok.png"]);

        // Exactly at the limit is fine
        validator.admit(&mut staged, vec![png("edge.png", 100)]).unwrap();
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn test_declared_size_is_what_counts() {
        let validator = InputValidator::new(ValidatorConfig {
            max_file_size_bytes: MIB,
            ..Default::default()
        });
        let mut staged = StagedFiles::default();
        let file = png("tiny-but-declared-huge.png", 8).with_declared_size(2 * MIB);

        let err = validator.admit(&mut staged, vec![file]).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let validator = InputValidator::default();
        let mut staged = StagedFiles::default();
        let pdf = StagedFile::new("doc.pdf", "application/pdf", vec![1, 2, 3]);

        let err = validator.admit(&mut staged, vec![pdf]).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { ref mime_type, .. } if mime_type == "application/pdf"));
        assert!(staged.is_empty());
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let validator = InputValidator::default();
        let mut staged = StagedFiles::default();
        let batch = vec![
            png("a.png", 1),
            StagedFile::new("b.txt", "text/plain", vec![1]),
            png("c.png", 1),
        ];

        let err = validator.admit(&mut staged, batch).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { ref filename, .. } if filename == "b.txt"));
        assert!(staged.is_empty());
    }

    #[test]
    fn test_first_failure_wins() {
        let validator = InputValidator::new(ValidatorConfig {
            max_file_size_bytes: 10,
            ..Default::default()
        });
        let mut staged = StagedFiles::default();
        let batch = vec![
            png("big.png", 11),
            StagedFile::new("b.txt", "text/plain", vec![1]),
        ];

        let err = validator.admit(&mut staged, batch).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_batch_over_count_is_rejected_whole() {
        let validator = InputValidator::default();
        let mut staged = StagedFiles::default();
        validator
            .admit(&mut staged, (0..3).map(|i| png(&format!("{i}.png"), 1)).collect())
            .unwrap();

        let err = validator
            .admit(&mut staged, (3..6).map(|i| png(&format!("{i}.png"), 1)).collect())
            .unwrap_err();
        assert_eq!(err, ValidationError::TooManyFiles { max: 5, attempted: 6 });
        assert_eq!(names(&staged), vec!["0.png", "1.png", "2.png"]);
    }

    #[test]
    fn test_sixth_file_rejected_one_at_a_time() {
        let validator = InputValidator::default();
        let mut staged = StagedFiles::default();

        for i in 0..5 {
            validator.admit(&mut staged, vec![png(&format!("{i}.png"), 1)]).unwrap();
        }
        let err = validator.admit(&mut staged, vec![png("5.png", 1)]).unwrap_err();

        assert!(matches!(err, ValidationError::TooManyFiles { max: 5, .. }));
        assert_eq!(staged.len(), 5);
    }

    #[test]
    fn test_remove_is_stable() {
        let validator = InputValidator::default();
        let mut staged = StagedFiles::default();
        validator
            .admit(&mut staged, ["a", "b", "c", "d"].iter().map(|n| png(n, 1)).collect())
            .unwrap();

        let removed = staged.remove(1).unwrap();
        assert_eq!(removed.filename(), "b");
        assert_eq!(names(&staged), vec!["a", "c", "d"]);

        assert_eq!(
            staged.remove(7).unwrap_err(),
            ValidationError::IndexOutOfRange { index: 7, len: 3 }
        );
    }
}
