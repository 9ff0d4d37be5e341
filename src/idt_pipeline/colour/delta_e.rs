use nalgebra::Vector3;
use palette::Lab;
use palette::color_difference::Ciede2000;
use palette::white_point::D65;

/// Euclidean distance, the colour difference used in IPT and Oklab.
pub fn euclidean_delta_e(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// CIEDE2000 colour difference between two CIE L*a*b* values.
///
/// The formula does not depend on the white the values are relative to.
pub fn delta_e_2000(lab_1: &Vector3<f64>, lab_2: &Vector3<f64>) -> f64 {
    let lab = |v: &Vector3<f64>| Lab::<D65, f64>::new(v.x, v.y, v.z);
    lab(lab_1).difference(lab(lab_2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharma_reference_pairs() {
        let pairs = [
            ([50.0, 2.6772, -79.7751], [50.0, 0.0, -82.7485], 2.0425),
            ([50.0, 3.1571, -77.2803], [50.0, 0.0, -82.7485], 2.8615),
            ([50.0, 2.5, 0.0], [73.0, 25.0, -18.0], 27.1492),
        ];
        for (a, b, expected) in pairs {
            let de = delta_e_2000(&Vector3::from(a), &Vector3::from(b));
            assert!((de - expected).abs() < 5e-4, "{de} != {expected}");
        }
    }

    #[test]
    fn test_identical_colours_have_zero_difference() {
        let lab = Vector3::new(42.0, -12.0, 30.0);
        assert!(delta_e_2000(&lab, &lab) < 1e-12);
        assert_eq!(euclidean_delta_e(&lab, &lab), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(euclidean_delta_e(&a, &b), 5.0);
    }
}
