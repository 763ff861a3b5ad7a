use log::{debug, trace};

use crate::error::{Phase, SolverInternalError};
use crate::options::SolveOptions;
use crate::standard::CanonicalModel;

/// Terminal state of the engine on a canonical model.
#[derive(Debug, Clone)]
pub(crate) enum Verdict {
    Optimal(Optimum),
    Infeasible,
    Unbounded,
}

/// Final tableau read-out of an optimal solve, in canonical column space.
#[derive(Debug, Clone)]
pub(crate) struct Optimum {
    pub values: Vec<f64>,
    /// Phase 2 reduced costs for every column, artificials included
    pub reduced_costs: Vec<f64>,
    pub is_basic: Vec<bool>,
}

#[derive(Debug, Clone)]
pub(crate) struct EngineOutput {
    pub verdict: Verdict,
    pub iterations: usize,
}

/// Two-phase simplex over a dense tableau.
pub(crate) struct Simplex {
    /// Maximum pivots across both phases
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Consecutive degenerate pivots tolerated before using Bland's rule
    degenerate_pivot_limit: usize,
}

enum SimplexResult {
    Optimal,
    Unbounded,
}

impl Simplex {
    pub fn new(options: &SolveOptions, canonical: &CanonicalModel) -> Self {
        Self {
            max_iterations: options.iteration_limit(canonical.num_rows(), canonical.num_columns()),
            tolerance: options.tolerance,
            degenerate_pivot_limit: options.degenerate_pivot_limit,
        }
    }

    pub fn solve(&self, canonical: &CanonicalModel) -> Result<EngineOutput, SolverInternalError> {
        let mut tableau = Tableau::build(canonical);
        debug!(
            "simplex: {} rows, {} columns ({} artificial), iteration limit {}",
            canonical.num_rows(),
            canonical.num_columns(),
            canonical.num_columns() - canonical.artificial_start,
            self.max_iterations,
        );

        // Phase 1: Find initial basic feasible solution
        if canonical.has_artificial() && !self.phase1(&mut tableau, canonical)? {
            debug!("simplex: infeasible after {} iterations", tableau.iterations);
            return Ok(EngineOutput {
                verdict: Verdict::Infeasible,
                iterations: tableau.iterations,
            });
        }

        // Phase 2: Optimize
        let verdict = match self.phase2(&mut tableau, canonical)? {
            SimplexResult::Optimal => {
                trace!(
                    "simplex: canonical objective {}",
                    tableau.objective_value() + canonical.offset
                );
                Verdict::Optimal(self.read_optimum(&tableau))
            }
            SimplexResult::Unbounded => Verdict::Unbounded,
        };
        debug!(
            "simplex: {} after {} iterations",
            match verdict {
                Verdict::Optimal(_) => "optimal",
                Verdict::Infeasible => "infeasible",
                Verdict::Unbounded => "unbounded",
            },
            tableau.iterations,
        );

        Ok(EngineOutput {
            verdict,
            iterations: tableau.iterations,
        })
    }

    /// Minimize the sum of artificial variables. Returns whether the
    /// original constraints are feasible.
    fn phase1(&self, tableau: &mut Tableau, canonical: &CanonicalModel) -> Result<bool, SolverInternalError> {
        let costs: Vec<f64> = (0..tableau.n_cols)
            .map(|j| if j >= tableau.artificial_start { 1.0 } else { 0.0 })
            .collect();
        tableau.set_objective(&costs);

        // Phase 1 is bounded below by zero, so an unbounded ray cannot occur
        let all_columns = tableau.n_cols;
        self.iterate(tableau, all_columns, Phase::One)?;

        let infeasibility = tableau.objective_value();
        debug!("simplex: phase 1 finished with artificial sum {:e}", infeasibility);
        if infeasibility > self.tolerance {
            return Ok(false);
        }

        self.drive_out_artificials(tableau);
        tableau.set_objective(&canonical.c);
        Ok(true)
    }

    fn phase2(&self, tableau: &mut Tableau, canonical: &CanonicalModel) -> Result<SimplexResult, SolverInternalError> {
        if !canonical.has_artificial() {
            tableau.set_objective(&canonical.c);
        }
        // Artificial columns never re-enter the basis
        let allowed = tableau.artificial_start;
        self.iterate(tableau, allowed, Phase::Two)
    }

    /// Pivot until no column below `allowed` has a negative reduced cost.
    fn iterate(&self, tableau: &mut Tableau, allowed: usize, phase: Phase) -> Result<SimplexResult, SolverInternalError> {
        let mut degenerate_run = 0;
        loop {
            let bland = degenerate_run >= self.degenerate_pivot_limit;
            let Some(pivot_col) = self.find_pivot_column(tableau, allowed, bland) else {
                return Ok(SimplexResult::Optimal);
            };
            let Some((pivot_row, ratio)) = self.find_pivot_row(tableau, pivot_col) else {
                return Ok(SimplexResult::Unbounded);
            };
            if tableau.iterations >= self.max_iterations {
                return Err(SolverInternalError::IterationLimit {
                    phase,
                    limit: self.max_iterations,
                });
            }

            trace!(
                "{}: pivot {} enters at row {} (leaving {}), ratio {:e}{}",
                phase,
                pivot_col,
                pivot_row,
                tableau.basis[pivot_row],
                ratio,
                if bland { " [bland]" } else { "" },
            );
            tableau.pivot(pivot_row, pivot_col, self.tolerance);
            tableau.iterations += 1;

            if ratio <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }

    /// Entering column among `0..allowed`.
    ///
    /// Dantzig's rule picks the most negative reduced cost; Bland's rule picks
    /// the first negative one. Ties go to the lowest index in both cases.
    fn find_pivot_column(&self, tableau: &Tableau, allowed: usize, bland: bool) -> Option<usize> {
        let obj_row = &tableau.data[tableau.n_rows];

        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for (j, &d) in obj_row.iter().enumerate().take(allowed) {
            if d < min_val {
                if bland {
                    return Some(j);
                }
                min_val = d;
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Leaving row by the minimum ratio test; ties go to the row whose basic
    /// variable has the lowest index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<(usize, f64)> {
        let rhs_col = tableau.n_cols;

        let mut best: Option<(usize, f64)> = None;

        for i in 0..tableau.n_rows {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min_ratio)) => {
                    if ratio < min_ratio - self.tolerance {
                        Some((i, ratio))
                    } else if (ratio - min_ratio).abs() <= self.tolerance
                        && tableau.basis[i] < tableau.basis[row]
                    {
                        Some((i, ratio.min(min_ratio)))
                    } else {
                        Some((row, min_ratio))
                    }
                }
            };
        }

        best
    }

    /// Pivot basic artificials (at zero level) out of the basis. Rows where no
    /// non-artificial column has a non-zero entry are redundant; their
    /// artificial stays basic at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        for i in 0..tableau.n_rows {
            if tableau.basis[i] < tableau.artificial_start {
                continue;
            }
            let replacement = (0..tableau.artificial_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            match replacement {
                Some(j) => {
                    trace!("phase 1: artificial {} replaced by {} at row {}", tableau.basis[i], j, i);
                    tableau.pivot(i, j, self.tolerance);
                }
                None => debug!("simplex: row {} is redundant", i),
            }
        }
    }

    fn read_optimum(&self, tableau: &Tableau) -> Optimum {
        let rhs_col = tableau.n_cols;
        let mut values = vec![0.0; tableau.n_cols];
        let mut is_basic = vec![false; tableau.n_cols];
        for (i, &basic) in tableau.basis.iter().enumerate() {
            let v = tableau.data[i][rhs_col];
            values[basic] = if v.abs() < self.tolerance { 0.0 } else { v };
            is_basic[basic] = true;
        }

        let reduced_costs = tableau.data[tableau.n_rows][..tableau.n_cols]
            .iter()
            .map(|&d| if d.abs() < self.tolerance { 0.0 } else { d })
            .collect();

        Optimum {
            values,
            reduced_costs,
            is_basic,
        }
    }
}

/// Constraint rows followed by the reduced-cost row; the last column holds
/// the right-hand side (negated objective value in the reduced-cost row).
struct Tableau {
    data: Vec<Vec<f64>>,
    basis: Vec<usize>,
    n_rows: usize,
    n_cols: usize,
    artificial_start: usize,
    iterations: usize,
}

impl Tableau {
    fn build(canonical: &CanonicalModel) -> Self {
        let n_rows = canonical.num_rows();
        let n_cols = canonical.num_columns();

        let mut data = Vec::with_capacity(n_rows + 1);
        for (row, &rhs) in canonical.a.iter().zip(&canonical.b) {
            let mut line = row.clone();
            line.push(rhs);
            data.push(line);
        }
        data.push(vec![0.0; n_cols + 1]);

        Self {
            data,
            basis: canonical.rows.iter().map(|r| r.seed).collect(),
            n_rows,
            n_cols,
            artificial_start: canonical.artificial_start,
            iterations: 0,
        }
    }

    /// Install `costs` as the objective and price out the current basis.
    fn set_objective(&mut self, costs: &[f64]) {
        let obj = self.n_rows;
        for (j, cell) in self.data[obj].iter_mut().enumerate() {
            *cell = costs.get(j).copied().unwrap_or(0.0);
        }
        for i in 0..self.n_rows {
            let factor = self.data[obj][self.basis[i]];
            if factor != 0.0 {
                for j in 0..=self.n_cols {
                    self.data[obj][j] -= factor * self.data[i][j];
                }
            }
        }
    }

    fn objective_value(&self) -> f64 {
        -self.data[self.n_rows][self.n_cols]
    }

    fn pivot(&mut self, row: usize, col: usize, tolerance: f64) {
        let n_cols = self.n_cols;

        // Update basic variable
        self.basis[row] = col;

        // Scale pivot row
        let pivot_val = self.data[row][col];
        for j in 0..=n_cols {
            self.data[row][j] /= pivot_val;
        }
        self.data[row][col] = 1.0;

        // Eliminate column in other rows, objective row included
        let pivot_row = self.data[row].clone();
        for (i, line) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = line[col];
            if factor == 0.0 {
                continue;
            }
            for (cell, &p) in line.iter_mut().zip(&pivot_row) {
                *cell -= factor * p;
            }
            line[col] = 0.0;
        }

        for i in 0..self.n_rows {
            if self.data[i][n_cols].abs() < tolerance {
                self.data[i][n_cols] = 0.0;
            }
        }
    }
}
