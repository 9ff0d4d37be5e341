//! Derivative-free Nelder-Mead simplex minimisation.

/// Reflection, expansion, contraction and shrink coefficients.
const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Converged once the objective spread over the simplex is below this
    pub epsilon: f64,
    /// Offset of each initial vertex from the start along one axis
    pub initial_step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimises `f` from `start`. Non-finite objective values rank as worst.
///
/// On reaching `max_iterations` the best vertex found is returned with
/// `converged == false`.
pub fn minimise<F>(f: F, start: &[f64], options: &NelderMeadOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let evaluate = |x: &[f64]| {
        let value = f(x);
        if value.is_finite() { value } else { f64::INFINITY }
    };

    let n = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.to_vec(), evaluate(start)));
    for axis in 0..n {
        let mut vertex = start.to_vec();
        vertex[axis] += options.initial_step;
        let value = evaluate(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;
    loop {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        if worst - best < options.epsilon {
            converged = true;
            break;
        }
        if iterations >= options.max_iterations {
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|i| simplex[..n].iter().map(|(x, _)| x[i]).sum::<f64>() / n as f64)
            .collect();
        let worst_vertex = simplex[n].0.clone();
        let towards = |coefficient: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&worst_vertex)
                .map(|(c, w)| c + coefficient * (c - w))
                .collect()
        };

        let reflected = towards(ALPHA);
        let reflected_value = evaluate(&reflected);

        if reflected_value < best {
            let expanded = towards(GAMMA);
            let expanded_value = evaluate(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }
        if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < worst {
            let outside = towards(RHO);
            let value = evaluate(&outside);
            (outside, value)
        } else {
            let inside = towards(-RHO);
            let value = evaluate(&inside);
            (inside, value)
        };
        if contracted_value < reflected_value.min(worst) {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            for (v, a) in vertex.iter_mut().zip(&anchor) {
                *v = a + SIGMA * (*v - a);
            }
            *value = evaluate(vertex);
        }
    }

    let (x, value) = simplex.swap_remove(0);
    Minimum {
        x,
        value,
        iterations,
        converged,
    }
}
