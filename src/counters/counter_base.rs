pub trait Counter {
    fn add(&mut self, item: &[u8]);

    /// Unrounded cardinality estimate.
    fn estimate(&self) -> f64;

    fn count(&self) -> u64 {
        self.estimate().round() as u64
    }
}
