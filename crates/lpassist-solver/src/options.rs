/// Algorithm used to answer a solve request.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Two-phase simplex on the continuous model
    #[default]
    Simplex,
    /// Branch-and-bound over the simplex relaxation
    Integer,
    /// Simplex on the dual model
    Dual,
    /// Simplex on the elastic relaxation, reporting violated constraints
    Relaxed,
    /// Integer when any variable is integer, Simplex otherwise
    Auto,
}

impl Method {
    /// Resolve `Auto` against a concrete model.
    pub fn resolve(self, has_integer_variables: bool) -> Method {
        match self {
            Method::Auto if has_integer_variables => Method::Integer,
            Method::Auto => Method::Simplex,
            other => other,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Simplex => "simplex",
            Method::Integer => "integer",
            Method::Dual => "dual",
            Method::Relaxed => "relaxed",
            Method::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Per-call solver configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Tolerance for floating point comparisons
    pub tolerance: f64,
    /// Pivot cap across both phases; derived from the tableau size when `None`
    pub max_iterations: Option<usize>,
    /// Consecutive degenerate pivots before switching to Bland's rule
    pub degenerate_pivot_limit: usize,
    /// Distance from the nearest integer accepted as integral
    pub integrality_tolerance: f64,
    /// Branch-and-bound node budget
    pub max_nodes: usize,
    pub method: Method,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: None,
            degenerate_pivot_limit: 50,
            integrality_tolerance: 1e-6,
            max_nodes: 10_000,
            method: Method::Simplex,
        }
    }
}

impl SolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_degenerate_pivot_limit(mut self, limit: usize) -> Self {
        self.degenerate_pivot_limit = limit;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Pivot cap for a tableau of `rows` constraints and `cols` columns.
    pub fn iteration_limit(&self, rows: usize, cols: usize) -> usize {
        self.max_iterations
            .unwrap_or_else(|| (50 * (rows + 1) * (cols + 1)).max(1000))
    }
}
