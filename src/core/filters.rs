use chrono::Timelike;

use crate::models::{Draw, Element, MatchResult};

/// Element of a drawn number, decided by its last decimal digit
#[inline]
pub fn digit_element(number: u8) -> Element {
    match number % 10 {
        1 | 6 => Element::Water,
        2 | 7 => Element::Fire,
        3 | 8 => Element::Wood,
        4 | 9 => Element::Metal,
        _ => Element::Earth,
    }
}

/// A number is compatible when its element is the user's own element or
/// the element that generates it.
#[inline]
pub fn is_compatible(user: Element, number: u8) -> bool {
    let element = digit_element(number);
    element == user || element.generates() == user
}

#[inline]
pub fn all_compatible(user: Element, numbers: &[u8]) -> bool {
    numbers.iter().all(|&n| is_compatible(user, n))
}

/// Returns the second-of-minute when one of the numbers equals it
#[inline]
pub fn matching_second(draw: &Draw) -> Option<u8> {
    let second = draw.timestamp.second() as u8;
    draw.numbers.contains(&second).then_some(second)
}

/// Full filter for one draw.
///
/// Stage 1 rejects any draw with an incompatible number, stage 2 keeps
/// only draws that contain the current second.
pub fn evaluate(user: Element, draw: &Draw) -> Option<MatchResult> {
    if !all_compatible(user, &draw.numbers) {
        return None;
    }

    matching_second(draw).map(|second| MatchResult {
        draw: draw.clone(),
        second,
    })
}
