//! Fixed-size batches of examples.

/// One batch handed to the decoder.
///
/// The last `fake_count` entries are filler that keeps the batch at its fixed
/// size; their captions are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<I> {
    pub ids: Vec<String>,
    pub inputs: Vec<I>,
    pub fake_count: usize,
}

impl<I> Batch<I> {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Examples whose captions are kept.
    pub fn real_count(&self) -> usize {
        self.len().saturating_sub(self.fake_count)
    }
}

/// Iterator over the batches of a dataset that can be rewound.
pub trait BatchSource {
    type Input;

    /// Next batch, or `None` once the dataset is exhausted.
    fn next_batch(&mut self) -> Option<Batch<Self::Input>>;

    /// Rewind to the first batch.
    fn reset(&mut self);

    fn num_batches(&self) -> usize;
}

/// In-memory [`BatchSource`] over `(id, input)` pairs.
///
/// Every batch holds exactly `batch_size` examples. The final batch is padded
/// by repeating its last real example.
#[derive(Debug, Clone)]
pub struct VecBatchSource<I> {
    items: Vec<(String, I)>,
    batch_size: usize,
    cursor: usize,
}

impl<I: Clone> VecBatchSource<I> {
    /// # Panics
    ///
    /// Panics if `batch_size == 0`.
    pub fn new(items: Vec<(String, I)>, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self { items, batch_size, cursor: 0 }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Filler examples in the final batch.
    pub fn fake_count(&self) -> usize {
        match self.items.len() % self.batch_size {
            0 => 0,
            rem => self.batch_size - rem,
        }
    }
}

impl<I: Clone> BatchSource for VecBatchSource<I> {
    type Input = I;

    fn next_batch(&mut self) -> Option<Batch<I>> {
        if self.cursor >= self.items.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.items.len());
        let chunk = &self.items[self.cursor..end];
        self.cursor = end;

        let mut ids: Vec<String> = chunk.iter().map(|(id, _)| id.clone()).collect();
        let mut inputs: Vec<I> = chunk.iter().map(|(_, input)| input.clone()).collect();
        let fake_count = self.batch_size - chunk.len();
        if let Some((last_id, last_input)) = chunk.last() {
            for _ in 0..fake_count {
                ids.push(last_id.clone());
                inputs.push(last_input.clone());
            }
        }
        Some(Batch { ids, inputs, fake_count })
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn num_batches(&self) -> usize {
        self.items.len().div_ceil(self.batch_size)
    }
}
