//! Loaders for the tab-separated rating and negative-candidate files.
//!
//! Ratings: `user<TAB>item[<TAB>rating[<TAB>timestamp]]`, one per line.
//! Negatives: `(user,item)<TAB>neg1<TAB>neg2...` or `user<TAB>neg1...`.
//! Blank lines are skipped in both formats; line numbers in errors are 1-based.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::data::{ItemId, NegativeCandidates, TestInstance, TrainMatrix, UserId};
use crate::error::{EvalError, Result};

/// One parsed line of a ratings file.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub user: UserId,
    pub item: ItemId,
    /// Explicit score, 1.0 when the column is absent.
    pub score: f64,
    pub timestamp: Option<i64>,
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, name: &str, line: usize) -> Result<T> {
    let raw = field.ok_or_else(|| EvalError::Parse {
        line,
        message: format!("missing {} column", name),
    })?;
    raw.trim().parse::<T>().map_err(|_| EvalError::Parse {
        line,
        message: format!("invalid {}: {:?}", name, raw),
    })
}

/// Parse ratings from any buffered reader.
pub fn parse_ratings<R: BufRead>(reader: R) -> Result<Vec<Rating>> {
    let mut ratings = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let user = parse_field::<UserId>(fields.next(), "user", line_no)?;
        let item = parse_field::<ItemId>(fields.next(), "item", line_no)?;
        let score = match fields.next() {
            Some(raw) => parse_field::<f64>(Some(raw), "rating", line_no)?,
            None => 1.0,
        };
        let timestamp = match fields.next() {
            Some(raw) => Some(parse_field::<i64>(Some(raw), "timestamp", line_no)?),
            None => None,
        };
        ratings.push(Rating {
            user,
            item,
            score,
            timestamp,
        });
    }
    Ok(ratings)
}

/// Parse negative-candidate lists from any buffered reader.
pub fn parse_negatives<R: BufRead>(reader: R) -> Result<NegativeCandidates> {
    let header = Regex::new(r"^\(\s*(\d+)\s*,\s*\d+\s*\)$|^(\d+)$")
        .map_err(|e| EvalError::InvalidInput(e.to_string()))?;

    let mut negatives = NegativeCandidates::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
        let head = fields.next().unwrap_or_default();
        let user = header
            .captures(head)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .ok_or_else(|| EvalError::Parse {
                line: line_no,
                message: format!("invalid user header: {:?}", head),
            })?;
        let user = parse_field::<UserId>(Some(user.as_str()), "user", line_no)?;

        let candidates = fields
            .map(|raw| parse_field::<ItemId>(Some(raw), "negative item", line_no))
            .collect::<Result<Vec<_>>>()?;
        negatives.set(user, candidates);
    }
    Ok(negatives)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        EvalError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(BufReader::new(file))
}

/// Load a ratings file.
pub fn load_ratings(path: &Path) -> Result<Vec<Rating>> {
    let ratings = parse_ratings(open(path)?)?;
    log::debug!("Loaded {} ratings from {}", ratings.len(), path.display());
    Ok(ratings)
}

/// Load a ratings file into a training matrix.
pub fn load_train_matrix(path: &Path) -> Result<TrainMatrix> {
    let ratings = load_ratings(path)?;
    Ok(TrainMatrix::from_pairs(ratings.into_iter().map(|r| (r.user, r.item))))
}

/// Load a ratings file as test instances, keeping file order.
pub fn load_test_instances(path: &Path) -> Result<Vec<TestInstance>> {
    let ratings = load_ratings(path)?;
    Ok(ratings
        .into_iter()
        .map(|r| TestInstance::new(r.user, r.item))
        .collect())
}

/// Load a negatives file.
pub fn load_negatives(path: &Path) -> Result<NegativeCandidates> {
    let negatives = parse_negatives(open(path)?)?;
    log::debug!(
        "Loaded negative candidates for {} users from {}",
        negatives.len(),
        path.display()
    );
    Ok(negatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{InteractionCounts, NegativeCandidateStore};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ratings_optional_columns() {
        let input = "0\t5\n\n1\t6\t4.5\n2\t7\t3\t978300760\n";
        let ratings = parse_ratings(Cursor::new(input)).unwrap();

        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[0].score, 1.0);
        assert_eq!(ratings[0].timestamp, None);
        assert_eq!(ratings[1].score, 4.5);
        assert_eq!(ratings[2].item, 7);
        assert_eq!(ratings[2].timestamp, Some(978300760));
    }

    #[test]
    fn test_parse_ratings_reports_line_number() {
        let input = "0\t5\n1\tabc\n";
        let err = parse_ratings(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, EvalError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_ratings_missing_item() {
        let err = parse_ratings(Cursor::new("3\n")).unwrap_err();
        assert!(err.to_string().contains("missing item"));
    }

    #[test]
    fn test_parse_negatives_both_header_forms() {
        let input = "(0,25)\t1\t2\t3\n1\t4\t5\n";
        let negatives = parse_negatives(Cursor::new(input)).unwrap();

        assert_eq!(negatives.candidates_for(0), Some(&[1, 2, 3][..]));
        assert_eq!(negatives.candidates_for(1), Some(&[4, 5][..]));
        assert_eq!(negatives.candidates_for(2), None);
    }

    #[test]
    fn test_parse_negatives_rejects_bad_header() {
        let err = parse_negatives(Cursor::new("(0,1)\t2\nuser7\t3\n")).unwrap_err();
        assert!(matches!(err, EvalError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_negatives_rejects_bad_item() {
        let err = parse_negatives(Cursor::new("(0,1)\t2\tx\n")).unwrap_err();
        assert!(err.to_string().contains("negative item"));
    }

    #[test]
    fn test_load_files() {
        let temp_dir = TempDir::new().unwrap();
        let train = temp_dir.path().join("train.rating");
        let test = temp_dir.path().join("test.rating");
        fs::write(&train, "0\t1\t5\t100\n0\t2\t3\t101\n1\t2\t4\t102\n").unwrap();
        fs::write(&test, "1\t3\t5\t200\n0\t4\t5\t150\n").unwrap();

        let matrix = load_train_matrix(&train).unwrap();
        assert_eq!(matrix.user_count(), 2);
        assert_eq!(matrix.count_for_user(0), 2);

        let instances = load_test_instances(&test).unwrap();
        assert_eq!(instances, vec![TestInstance::new(1, 3), TestInstance::new(0, 4)]);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_negatives(Path::new("does-not-exist.negative")).unwrap_err();
        assert!(matches!(err, EvalError::Io(_)));
        assert!(err.to_string().contains("does-not-exist.negative"));
    }
}
