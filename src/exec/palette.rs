// src/exec/palette.rs

//! Display colours for concurrently running commands.
//!
//! A small fixed palette is shared by every running command. `checkout`
//! prefers a colour nobody is using, least recently assigned first, and only
//! doubles up when all of them are busy.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use colored::Color;

/// Default command colours.
pub const CMD_COLORS: [Color; 5] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
];

#[derive(Debug)]
struct PaletteState {
    /// Active leases per colour index.
    counts: Vec<usize>,
    /// Rotation order; the back holds the most recently assigned colour.
    queue: VecDeque<usize>,
}

#[derive(Debug)]
pub struct Palette {
    colors: Vec<Color>,
    state: Mutex<PaletteState>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::with_colors(CMD_COLORS.to_vec())
    }
}

impl Palette {
    /// Build a palette from the given colours, falling back to
    /// [`CMD_COLORS`] when the list is empty.
    pub fn with_colors(colors: Vec<Color>) -> Self {
        let colors = if colors.is_empty() {
            CMD_COLORS.to_vec()
        } else {
            colors
        };
        let state = PaletteState {
            counts: vec![0; colors.len()],
            queue: (0..colors.len()).collect(),
        };
        Self {
            colors,
            state: Mutex::new(state),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Lease a colour. It is released when the lease is dropped.
    pub fn checkout(self: &Arc<Self>) -> ColorLease {
        let mut state = self.lock();

        let position = state
            .queue
            .iter()
            .position(|&c| state.counts[c] == 0)
            .unwrap_or(0);

        let index = state.queue.remove(position).unwrap_or(0);
        state.queue.push_back(index);
        state.counts[index] += 1;

        ColorLease {
            palette: Arc::clone(self),
            index,
        }
    }

    /// Number of active leases on the colour at `index`.
    pub fn in_use(&self, index: usize) -> usize {
        self.lock().counts.get(index).copied().unwrap_or(0)
    }

    fn release(&self, index: usize) {
        let mut state = self.lock();
        if let Some(count) = state.counts.get_mut(index) {
            *count = count.saturating_sub(1);
        }
    }

    fn lock(&self) -> MutexGuard<'_, PaletteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A colour held by one running command.
#[derive(Debug)]
pub struct ColorLease {
    palette: Arc<Palette>,
    index: usize,
}

impl ColorLease {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn color(&self) -> Color {
        self.palette.colors[self.index]
    }
}

impl Drop for ColorLease {
    fn drop(&mut self) {
        self.palette.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_leases_get_distinct_colours_until_exhausted() {
        let palette = Arc::new(Palette::default());
        let leases: Vec<_> = (0..palette.len()).map(|_| palette.checkout()).collect();

        let mut seen: Vec<_> = leases.iter().map(ColorLease::index).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), palette.len());
    }

    #[test]
    fn released_colour_is_preferred_over_doubling_up() {
        let palette = Arc::new(Palette::default());
        let mut leases: Vec<_> = (0..palette.len()).map(|_| palette.checkout()).collect();

        let freed = leases.remove(2).index();
        assert_eq!(palette.in_use(freed), 0);

        let next = palette.checkout();
        assert_eq!(next.index(), freed);
        assert_eq!(palette.in_use(freed), 1);
    }

    #[test]
    fn all_busy_falls_back_to_least_recently_assigned() {
        let palette = Arc::new(Palette::with_colors(vec![Color::Red, Color::Blue]));
        let a = palette.checkout();
        let b = palette.checkout();
        assert_eq!((a.index(), b.index()), (0, 1));

        // Both busy: queue head is colour 0, the least recently assigned.
        let c = palette.checkout();
        assert_eq!(c.index(), 0);
        assert_eq!(palette.in_use(0), 2);

        // Colour 1 is now the head and reused next.
        let d = palette.checkout();
        assert_eq!(d.index(), 1);
    }

    #[test]
    fn sequential_use_rotates_through_palette() {
        let palette = Arc::new(Palette::default());
        let order: Vec<_> = (0..palette.len() + 1)
            .map(|_| palette.checkout().index())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn empty_palette_uses_defaults() {
        let palette = Palette::with_colors(Vec::new());
        assert_eq!(palette.len(), CMD_COLORS.len());
    }
}
