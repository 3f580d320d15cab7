use crate::error::SolverError;

use super::ode::{DiffEqSolver, OdeSystem};

/// Classic fourth-order Runge-Kutta.
#[derive(Debug, Clone, Default)]
pub struct RungeKutta {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    scratch: Vec<f64>,
}

impl RungeKutta {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `out = x + k * scale`
fn offset(out: &mut Vec<f64>, x: &[f64], k: &[f64], scale: f64) {
    out.clear();
    out.extend(x.iter().zip(k).map(|(x, k)| x + k * scale));
}

fn resize(buffers: &mut [&mut Vec<f64>], n: usize) {
    for buffer in buffers.iter_mut() {
        buffer.clear();
        buffer.resize(n, 0.0);
    }
}

impl RungeKutta {
    fn stages(&mut self, system: &mut dyn OdeSystem, x: &[f64], h: f64) -> Result<Vec<f64>, SolverError> {
        let n = x.len();
        resize(&mut [&mut self.k1, &mut self.k2, &mut self.k3, &mut self.k4], n);

        system.evaluate(x, &mut self.k1, h)?;
        offset(&mut self.scratch, x, &self.k1, h / 2.0);
        system.evaluate(&self.scratch, &mut self.k2, h)?;
        offset(&mut self.scratch, x, &self.k2, h / 2.0);
        system.evaluate(&self.scratch, &mut self.k3, h)?;
        offset(&mut self.scratch, x, &self.k3, h);
        system.evaluate(&self.scratch, &mut self.k4, h)?;

        Ok((0..n)
            .map(|i| x[i] + h * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]) / 6.0)
            .collect())
    }
}

impl DiffEqSolver for RungeKutta {
    fn step(&mut self, system: &mut dyn OdeSystem, step_size: f64) -> Result<(), SolverError> {
        let x = system.vars();
        let result = self.stages(system, &x, step_size);
        finish(system, &x, result)
    }

    fn name(&self) -> &'static str {
        "runge-kutta"
    }
}

/// Installs `next` or, on any failure, puts the starting state back.
fn finish(system: &mut dyn OdeSystem, start: &[f64], next: Result<Vec<f64>, SolverError>) -> Result<(), SolverError> {
    match next {
        Ok(next) if next.iter().all(|v| v.is_finite()) => {
            system.set_vars(&next);
            Ok(())
        }
        Ok(_) => {
            system.set_vars(start);
            Err(SolverError::NonFinite)
        }
        Err(e) => {
            system.set_vars(start);
            Err(e)
        }
    }
}

/// Second-order modified Euler (Heun's method).
#[derive(Debug, Clone, Default)]
pub struct ModifiedEuler {
    k1: Vec<f64>,
    k2: Vec<f64>,
    scratch: Vec<f64>,
}

impl ModifiedEuler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModifiedEuler {
    fn stages(&mut self, system: &mut dyn OdeSystem, x: &[f64], h: f64) -> Result<Vec<f64>, SolverError> {
        let n = x.len();
        resize(&mut [&mut self.k1, &mut self.k2], n);

        system.evaluate(x, &mut self.k1, h)?;
        offset(&mut self.scratch, x, &self.k1, h);
        system.evaluate(&self.scratch, &mut self.k2, h)?;

        Ok((0..n).map(|i| x[i] + h * (self.k1[i] + self.k2[i]) / 2.0).collect())
    }
}

impl DiffEqSolver for ModifiedEuler {
    fn step(&mut self, system: &mut dyn OdeSystem, step_size: f64) -> Result<(), SolverError> {
        let x = system.vars();
        let result = self.stages(system, &x, step_size);
        finish(system, &x, result)
    }

    fn name(&self) -> &'static str {
        "modified-euler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-6;

    /// x'' = -x as [x, v, t].
    struct Oscillator {
        vars: Vec<f64>,
    }

    impl OdeSystem for Oscillator {
        fn vars(&self) -> Vec<f64> {
            self.vars.clone()
        }

        fn set_vars(&mut self, vars: &[f64]) {
            self.vars = vars.to_vec();
        }

        fn evaluate(&mut self, vars: &[f64], change: &mut [f64], _time_step: f64) -> Result<(), SolverError> {
            change[0] = vars[1];
            change[1] = -vars[0];
            change[2] = 1.0;
            Ok(())
        }
    }

    struct Exploding;

    impl OdeSystem for Exploding {
        fn vars(&self) -> Vec<f64> {
            vec![1.0]
        }

        fn set_vars(&mut self, _vars: &[f64]) {}

        fn evaluate(&mut self, _vars: &[f64], change: &mut [f64], _time_step: f64) -> Result<(), SolverError> {
            change[0] = f64::INFINITY;
            Ok(())
        }
    }

    fn run(solver: &mut dyn DiffEqSolver, steps: usize) -> Vec<f64> {
        let mut system = Oscillator { vars: vec![1.0, 0.0, 0.0] };
        let h = 2.0 * PI / steps as f64;
        for _ in 0..steps {
            solver.step(&mut system, h).unwrap();
        }
        system.vars
    }

    #[test]
    fn test_runge_kutta_full_period() {
        let vars = run(&mut RungeKutta::new(), 200);
        assert!((vars[0] - 1.0).abs() < EPSILON);
        assert!(vars[1].abs() < EPSILON);
        assert!((vars[2] - 2.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_modified_euler_full_period() {
        let vars = run(&mut ModifiedEuler::new(), 2000);
        assert!((vars[0] - 1.0).abs() < 1e-3);
        assert!(vars[1].abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_step_rejected() {
        assert_eq!(RungeKutta::new().step(&mut Exploding, 0.1), Err(SolverError::NonFinite));
        assert_eq!(ModifiedEuler::new().step(&mut Exploding, 0.1), Err(SolverError::NonFinite));
    }
}
