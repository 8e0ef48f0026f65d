//! Batch assembly

use contracts::{BufferedItem, GroupKey, ObservationBatch};

/// Split `items` into consecutive batches of at most `batch_size` payloads
///
/// Items keep the order they were fetched in. The last batch may be shorter; no batch
/// is empty. A `batch_size` of zero is treated as one.
pub fn make_batches(
    key: &GroupKey,
    items: &[BufferedItem],
    batch_size: usize,
) -> Vec<ObservationBatch> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| ObservationBatch {
            key: *key,
            payloads: chunk.iter().map(|item| item.payload.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EncryptedMessage;

    fn items(n: usize) -> Vec<BufferedItem> {
        (0..n)
            .map(|i| {
                BufferedItem::new(
                    format!("obs-{i}"),
                    EncryptedMessage::from_ciphertext(vec![i as u8]),
                    0,
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let key = GroupKey::new(1, 1, 1, 0);
        assert!(make_batches(&key, &[], 10).is_empty());
    }

    #[test]
    fn test_batch_counts_and_sizes() {
        let key = GroupKey::new(1, 1, 1, 0);
        for (n, size) in [(7, 3), (9, 3), (1, 5), (10, 1), (100, 30)] {
            let batches = make_batches(&key, &items(n), size);
            assert_eq!(batches.len(), n.div_ceil(size), "n={n} size={size}");

            let (last, full) = batches.split_last().unwrap();
            assert!(full.iter().all(|b| b.len() == size));
            assert!(!last.is_empty() && last.len() <= size);
        }
    }

    #[test]
    fn test_batches_preserve_order_without_overlap() {
        let key = GroupKey::new(4, 5, 6, 7);
        let input = items(7);
        let batches = make_batches(&key, &input, 3);

        let flattened: Vec<_> = batches
            .iter()
            .flat_map(|b| b.payloads.iter().cloned())
            .collect();
        let expected: Vec<_> = input.iter().map(|i| i.payload.clone()).collect();
        assert_eq!(flattened, expected);
        assert!(batches.iter().all(|b| b.key == key));
    }

    #[test]
    fn test_deterministic() {
        let key = GroupKey::new(1, 1, 1, 0);
        let input = items(11);
        assert_eq!(make_batches(&key, &input, 4), make_batches(&key, &input, 4));
    }

    #[test]
    fn test_zero_batch_size_treated_as_one() {
        let key = GroupKey::new(1, 1, 1, 0);
        assert_eq!(make_batches(&key, &items(3), 0).len(), 3);
    }
}
