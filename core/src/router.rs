use crate::index::PartitionDirectory;

/// Returns the partition file that must hold the postings of `term`.
///
/// Picks the file co-indexed with the first key strictly greater than `term`, or the last file
/// when `term` sorts at or after every key. Keys compare with `str` ordering, i.e. byte-wise,
/// which must match the order the index builder cut its ranges with.
pub fn resolve_file<'a>(term: &str, directory: &'a PartitionDirectory) -> &'a str {
    let files = directory.files();
    // keys are ascending, so the first key > term is the partition point of `key <= term`
    let slot = directory.keys().partition_point(|key| key.as_str() <= term);
    &files[slot.min(files.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(keys: &[&str], files: &[&str]) -> PartitionDirectory {
        PartitionDirectory::new(
            keys.iter().map(|k| k.to_string()).collect(),
            files.iter().map(|f| f.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn boundary_key_routes_right() {
        let d = dir(&["m"], &["p0", "p1"]);
        assert_eq!(resolve_file("m", &d), "p1");
        assert_eq!(resolve_file("abc", &d), "p0");
        assert_eq!(resolve_file("ma", &d), "p1");
        assert_eq!(resolve_file("", &d), "p0");
    }

    #[test]
    fn one_key_per_file() {
        let d = dir(&["f", "q", "t"], &["a.json", "b.json", "c.json"]);
        assert_eq!(resolve_file("apple", &d), "a.json");
        assert_eq!(resolve_file("f", &d), "b.json");
        assert_eq!(resolve_file("pear", &d), "b.json");
        assert_eq!(resolve_file("quince", &d), "c.json");
        // at or past the last key falls through to the last file
        assert_eq!(resolve_file("t", &d), "c.json");
        assert_eq!(resolve_file("zebra", &d), "c.json");
    }

    #[test]
    fn comparison_is_bytewise() {
        let d = dir(&["Z", "a"], &["upper", "lower", "rest"]);
        // 'Z' (0x5a) < '_' (0x5f) < 'a' (0x61)
        assert_eq!(resolve_file("_id", &d), "lower");
        assert_eq!(resolve_file("Apple", &d), "upper");
        assert_eq!(resolve_file("é", &d), "rest");
    }

    #[test]
    fn matches_linear_scan() {
        let d = dir(&["b", "d", "f", "h"], &["0", "1", "2", "3", "4"]);
        for term in ["", "a", "b", "bb", "c", "d", "e", "f", "g", "h", "hh", "z"] {
            let linear = d
                .keys()
                .iter()
                .position(|k| term < k.as_str())
                .map(|i| d.files()[i].as_str())
                .unwrap_or_else(|| d.files().last().unwrap().as_str());
            assert_eq!(resolve_file(term, &d), linear, "term {term:?}");
        }
    }

    #[test]
    fn single_file_takes_everything() {
        let d = dir(&[], &["only"]);
        assert_eq!(resolve_file("anything", &d), "only");
    }
}
