/// Compute `sqrt(a^2 + b^2)` without destructive underflow or overflow.
pub fn pythag(a: f64, b: f64) -> f64 {
    let (absa, absb) = (a.abs(), b.abs());
    if absa > absb {
        absa * (1. + (absb / absa) * (absb / absa)).sqrt()
    } else if absb == 0. {
        0.
    } else {
        absb * (1. + (absa / absb) * (absa / absb)).sqrt()
    }
}

/// Return `|a|` with the sign of `b`. A zero `b` counts as positive.
#[inline]
pub fn sign(a: f64, b: f64) -> f64 {
    if b >= 0. {
        a.abs()
    } else {
        -a.abs()
    }
}

#[cfg(test)]
mod test {
    use super::{pythag, sign};

    #[test]
    fn hypotenuse() {
        assert_eq!(pythag(3., 4.), 5.);
        assert_eq!(pythag(-4., 3.), 5.);
        assert_eq!(pythag(0., 0.), 0.);
        assert_eq!(pythag(1e200, 1e200), 1e200 * 2f64.sqrt());
    }

    #[test]
    fn signs() {
        assert_eq!(sign(2., -0.5), -2.);
        assert_eq!(sign(-2., 0.), 2.);
        assert_eq!(sign(-2., 3.), 2.);
    }
}
