use crate::status::StatusSnapshot;

/// A field whose value differs from the previous snapshot. `old` is `None`
/// when the field was not present before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<i32>,
    pub new: i32,
}

/// Did `field` change between two reads?
///
/// With no previous read everything counts as changed. `None` means the
/// answer is unknown because one side lacks the field.
pub fn has_changed(
    previous: Option<&StatusSnapshot>,
    current: Option<&StatusSnapshot>,
    field: &str,
) -> Option<bool> {
    let Some(previous) = previous else {
        return Some(true);
    };
    let old = previous.get(field)?;
    let new = current?.get(field)?;
    Some(old != new)
}

pub fn diff_snapshots(previous: Option<&StatusSnapshot>, current: &StatusSnapshot) -> Vec<FieldChange> {
    current
        .iter()
        .filter_map(|(field, new)| {
            let old = previous.and_then(|p| p.get(field));
            (old != Some(new)).then(|| FieldChange {
                field: field.to_string(),
                old,
                new,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, i32)]) -> StatusSnapshot {
        StatusSnapshot::new(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            pairs.iter().map(|(_, v)| *v).collect(),
        )
        .unwrap()
    }

    #[test]
    fn first_read_reports_everything_changed() {
        let curr = snapshot(&[("Pow", 1)]);
        assert_eq!(has_changed(None, Some(&curr), "Pow"), Some(true));
        assert_eq!(has_changed(None, None, "Pow"), Some(true));
        assert_eq!(diff_snapshots(None, &curr).len(), 1);
    }

    #[test]
    fn detects_leaf_change() {
        let prev = snapshot(&[("Pow", 1), ("Mod", 1)]);
        let curr = snapshot(&[("Pow", 0), ("Mod", 1)]);
        assert_eq!(has_changed(Some(&prev), Some(&curr), "Pow"), Some(true));
        assert_eq!(has_changed(Some(&prev), Some(&curr), "Mod"), Some(false));

        let changes = diff_snapshots(Some(&prev), &curr);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "Pow".into(),
                old: Some(1),
                new: 0
            }]
        );
    }

    #[test]
    fn missing_field_is_unknown() {
        let prev = snapshot(&[("Pow", 1)]);
        let curr = snapshot(&[("Pow", 1), ("Lig", 1)]);
        assert_eq!(has_changed(Some(&prev), Some(&curr), "Lig"), None);
        assert_eq!(has_changed(Some(&curr), Some(&prev), "Lig"), None);
    }

    #[test]
    fn column_order_does_not_matter() {
        let prev = snapshot(&[("Pow", 1), ("Mod", 4)]);
        let curr = snapshot(&[("Mod", 4), ("Pow", 1)]);
        assert!(diff_snapshots(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn new_field_reported_with_no_old_value() {
        let prev = snapshot(&[("Pow", 1)]);
        let curr = snapshot(&[("Pow", 1), ("Lig", 0)]);
        let changes = diff_snapshots(Some(&prev), &curr);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Lig");
        assert_eq!(changes[0].old, None);
    }
}
