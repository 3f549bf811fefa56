use crate::models::Element;

/// Heavenly stem values indexed by `year % 10`
/// (Canh, Tân, Nhâm, Quý, Giáp, Ất, Bính, Đinh, Mậu, Kỷ).
const CAN_VALUES: [u8; 10] = [4, 4, 5, 5, 1, 1, 2, 2, 3, 3];

/// Earthly branch values indexed by `year % 12`
/// (Thân, Dậu, Tuất, Hợi, Tý, Sửu, Dần, Mão, Thìn, Tỵ, Ngọ, Mùi).
const CHI_VALUES: [u8; 12] = [1, 1, 2, 2, 0, 0, 1, 1, 2, 2, 0, 0];

/// Element for each reduced total 1..=5
const ELEMENT_BY_TOTAL: [Element; 5] = [
    Element::Metal,
    Element::Water,
    Element::Fire,
    Element::Earth,
    Element::Wood,
];

/// Element of a lunar year.
///
/// Sums the stem and branch values and wraps the result into 1..=5.
/// Total over every `i32`: stems are 1..=5 and branches 0..=2, so the
/// sum is at most 7 and one subtraction is always enough.
#[inline]
pub fn element_of_year(year: i32) -> Element {
    let can = CAN_VALUES[year.rem_euclid(10) as usize];
    let chi = CHI_VALUES[year.rem_euclid(12) as usize];

    let mut total = can + chi;
    if total > 5 {
        total -= 5;
    }

    ELEMENT_BY_TOTAL[(total - 1) as usize]
}
