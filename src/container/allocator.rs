//! Number, color and icon allocation for new containers

use std::collections::{BTreeSet, HashMap};

use rand::seq::IndexedRandom;
use rand::Rng;

use super::types::{Color, Icon};
use crate::config::NumberMode;

/// Compute the number for the next container.
///
/// `keep` mode returns `counter + 1`; the caller stores it as the new counter.
/// `reuse` mode returns the smallest positive number missing from `known`.
pub fn next_number(mode: NumberMode, counter: u32, known: &[u32]) -> u32 {
    match mode {
        NumberMode::Keep => counter.saturating_add(1),
        NumberMode::Reuse => {
            let known: BTreeSet<u32> = known.iter().copied().filter(|n| *n > 0).collect();
            let max = match known.iter().next_back() {
                Some(max) => *max,
                None => return 1,
            };
            (1..max).find(|n| !known.contains(n)).unwrap_or(max.saturating_add(1))
        }
    }
}

/// Colors that keep the palette evenly used.
///
/// Returns every palette color assigned fewer times than the most used one,
/// or the whole palette when usage is already even.
pub fn available_colors(existing: &[Color], palette: &[Color]) -> Vec<Color> {
    let mut counts: HashMap<Color, usize> = HashMap::new();
    for color in existing {
        *counts.entry(*color).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);

    let available: Vec<Color> = palette
        .iter()
        .copied()
        .filter(|color| counts.get(color).copied().unwrap_or(0) < max)
        .collect();

    if available.is_empty() {
        palette.to_vec()
    } else {
        available
    }
}

/// Pick a color, balanced across the palette when randomization is on
pub fn pick_color<R: Rng + ?Sized>(
    rng: &mut R,
    random: bool,
    fixed: Color,
    existing: &[Color],
) -> Color {
    if !random {
        return fixed;
    }
    available_colors(existing, &Color::ALL)
        .choose(rng)
        .copied()
        .unwrap_or(fixed)
}

/// Pick an icon, uniformly at random when randomization is on
pub fn pick_icon<R: Rng + ?Sized>(rng: &mut R, random: bool, fixed: Icon) -> Icon {
    if !random {
        return fixed;
    }
    Icon::ALL.choose(rng).copied().unwrap_or(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_number_keep() {
        assert_eq!(next_number(NumberMode::Keep, 0, &[]), 1);
        assert_eq!(next_number(NumberMode::Keep, 7, &[1, 2]), 8);
    }

    #[test]
    fn test_next_number_saturates_at_max() {
        assert_eq!(next_number(NumberMode::Keep, u32::MAX, &[]), u32::MAX);
        assert_eq!(next_number(NumberMode::Reuse, 0, &[u32::MAX]), 1);
    }

    #[test]
    fn test_next_number_reuse_fills_gap() {
        assert_eq!(next_number(NumberMode::Reuse, 0, &[1, 3, 4]), 2);
        assert_eq!(next_number(NumberMode::Reuse, 0, &[4, 3, 1]), 2);
        assert_eq!(next_number(NumberMode::Reuse, 0, &[2, 3]), 1);
    }

    #[test]
    fn test_next_number_reuse_no_gap() {
        assert_eq!(next_number(NumberMode::Reuse, 0, &[1, 2, 3]), 4);
        assert_eq!(next_number(NumberMode::Reuse, 9, &[]), 1);
    }

    #[test]
    fn test_next_number_reuse_large_numbers_sorted_numerically() {
        assert_eq!(next_number(NumberMode::Reuse, 0, &[1, 2, 10, 3]), 4);
    }

    #[test]
    fn test_available_colors_balances() {
        let existing = [Color::Blue, Color::Blue, Color::Green];
        let palette = [Color::Blue, Color::Green, Color::Yellow];
        assert_eq!(
            available_colors(&existing, &palette),
            vec![Color::Green, Color::Yellow]
        );
    }

    #[test]
    fn test_available_colors_even_returns_palette() {
        let palette = [Color::Blue, Color::Green];
        assert_eq!(available_colors(&[], &palette), palette.to_vec());
        assert_eq!(
            available_colors(&[Color::Blue, Color::Green], &palette),
            palette.to_vec()
        );
    }

    #[test]
    fn test_pick_color_stays_balanced() {
        let mut rng = rand::rng();
        let mut existing = Vec::new();
        for _ in 0..(Color::ALL.len() * 3) {
            let color = pick_color(&mut rng, true, Color::Red, &existing);
            existing.push(color);
        }
        for color in Color::ALL {
            assert_eq!(existing.iter().filter(|c| **c == color).count(), 3);
        }
    }

    #[test]
    fn test_pick_fixed() {
        let mut rng = rand::rng();
        assert_eq!(pick_color(&mut rng, false, Color::Pink, &[Color::Pink]), Color::Pink);
        assert_eq!(pick_icon(&mut rng, false, Icon::Tree), Icon::Tree);
        assert!(Icon::ALL.contains(&pick_icon(&mut rng, true, Icon::Tree)));
    }
}
