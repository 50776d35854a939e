use super::*;

#[test]
fn mul_div255_edges() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(255, 0), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
}

#[test]
fn gcd_reduces_common_rates() {
    assert_eq!(gcd_u32(30_000, 1000), 1000);
    assert_eq!(gcd_u32(29_970, 1000), 10);
    assert_eq!(gcd_u32(0, 0), 1);
}

#[test]
fn ycbcr_primaries() {
    assert_eq!(rgb_to_ycbcr(0, 0, 0), [0, 128, 128]);
    assert_eq!(rgb_to_ycbcr(255, 255, 255), [255, 128, 128]);
    let [y, cb, cr] = rgb_to_ycbcr(255, 0, 0);
    assert_eq!(y, 76);
    assert!(cb < 128);
    assert_eq!(cr, 255);
}
