//! Property tests for `VecBatchSource`.

use capbeam_engine::{BatchSource, VecBatchSource};
use proptest::prelude::*;

proptest! {
    #[test]
    fn batches_are_full_and_real_examples_keep_order(n in 0usize..50, batch_size in 1usize..9) {
        let items: Vec<(String, usize)> = (0..n).map(|i| (i.to_string(), i)).collect();
        let mut source = VecBatchSource::new(items, batch_size);

        let mut seen = Vec::new();
        let mut batches = 0;
        let mut fakes = 0;
        while let Some(batch) = source.next_batch() {
            prop_assert_eq!(batch.len(), batch_size);
            prop_assert_eq!(batch.ids.len(), batch.inputs.len());
            seen.extend(batch.inputs.iter().take(batch.real_count()).copied());
            fakes += batch.fake_count;
            batches += 1;
        }

        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
        prop_assert_eq!(batches, source.num_batches());
        prop_assert_eq!(fakes, source.fake_count());
    }
}
