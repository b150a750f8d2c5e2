use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
}

#[test]
fn db_to_gain_reference_points() {
    assert!((db_to_gain(0.0) - 1.0).abs() < 1e-12);
    assert!((db_to_gain(20.0) - 10.0).abs() < 1e-9);
}

#[test]
fn exp_lerp_hits_endpoints() {
    assert!((exp_lerp(200.0, 4000.0, 0.0) - 200.0).abs() < 1e-9);
    assert!((exp_lerp(200.0, 4000.0, 1.0) - 4000.0).abs() < 1e-6);
    assert!((lerp(1.0, 3.0, 0.5) - 2.0).abs() < 1e-12);
}

#[test]
fn xorshift_is_deterministic_and_bounded() {
    let mut a = XorShift32::new(7);
    let mut b = XorShift32::new(7);
    for _ in 0..1000 {
        let x = a.next_bipolar();
        assert_eq!(x, b.next_bipolar());
        assert!((-1.0..=1.0).contains(&x));
    }
}
