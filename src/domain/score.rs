/// Similarity score attached to vector-search results or used as a
/// threshold parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    value: f64,
}

impl Score {
    /// Creates a score.
    pub fn of(value: f64) -> Self {
        Self { value }
    }

    /// Raw score value.
    pub fn value(self) -> f64 {
        self.value
    }
}

/// Inclusive range of acceptable scores. Missing bounds are open.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreRange {
    lower: Option<Score>,
    upper: Option<Score>,
}

impl ScoreRange {
    /// Range between `lower` and `upper`.
    pub fn between(lower: Score, upper: Score) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Range with only a lower bound.
    pub fn at_least(lower: Score) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// The unbounded range.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Lower bound.
    pub fn lower(&self) -> Option<Score> {
        self.lower
    }

    /// Upper bound.
    pub fn upper(&self) -> Option<Score> {
        self.upper
    }

    /// Whether `score` lies within the range.
    pub fn contains(&self, score: Score) -> bool {
        self.lower.map_or(true, |l| score.value >= l.value)
            && self.upper.map_or(true, |u| score.value <= u.value)
    }
}

/// Embedding vector used for similarity search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vector(Vec<f32>);

impl Vector {
    /// Wraps raw components.
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Vector components.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f32>> for Vector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}
