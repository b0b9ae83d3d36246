//! Energy / success trade-off points and Pareto dominance.

/// A generic point that carries a parameter (what produced it), the energy
/// it cost and the success rate it achieved.
#[derive(Clone, Debug, PartialEq)]
pub struct Point<T> {
    /// Param
    pub param: T,

    /// Total energy (J); lower is better.
    pub energy: f64,

    /// Success rate; higher is better.
    pub success: f64,
}

impl<T> Point<T> {
    /// Whether `self` is at least as good as `other` on both axes and strictly
    /// better on one.
    pub fn dominates<U>(&self, other: &Point<U>) -> bool {
        self.energy <= other.energy
            && self.success >= other.success
            && (self.energy < other.energy || self.success > other.success)
    }
}

/// A pool of points, typically one per (policy, seed).
#[derive(Clone, Debug)]
pub struct Pool<T> {
    points: Vec<Point<T>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool { points: Vec::new() }
    }
}

impl<T> Pool<T> {
    /// Adds new entry to the pool. Points with a non-finite coordinate are
    /// ignored.
    pub fn add(&mut self, param: T, energy: f64, success: f64) {
        if !energy.is_finite() || !success.is_finite() {
            trace!("ignoring point ({}, {})", energy, success);
            return;
        }
        self.points.push(Point {
            param: param,
            energy: energy,
            success: success,
        })
    }

    /// All points.
    pub fn points(&self) -> &[Point<T>] {
        &self.points
    }

    /// Whether any other point of the pool dominates `point`.
    pub fn is_dominated<U>(&self, point: &Point<U>) -> bool {
        self.points.iter().any(|p| p.dominates(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(energy: f64, success: f64) -> Point<()> {
        Point {
            param: (),
            energy: energy,
            success: success,
        }
    }

    #[test]
    fn test_dominance() {
        let a = point(5.0, 0.9);
        assert!(a.dominates(&point(6.0, 0.85)));
        assert!(!a.dominates(&point(4.0, 0.80)));
        assert!(!point(4.0, 0.80).dominates(&a));
        assert!(!a.dominates(&a));
        assert!(a.dominates(&point(5.0, 0.8)));
        assert!(a.dominates(&point(5.5, 0.9)));
    }

    #[test]
    fn test_pool_skips_non_finite() {
        let mut pool = Pool::default();
        pool.add(1, 5.0, 0.9);
        pool.add(2, ::std::f64::NAN, 1.0);
        pool.add(3, 4.0, ::std::f64::INFINITY);
        assert_eq!(pool.points().len(), 1);
        assert!(pool.is_dominated(&point(6.0, 0.85)));
        assert!(!pool.is_dominated(&point(4.0, 0.80)));
        assert!(!pool.is_dominated(&pool.points()[0]));
    }
}
