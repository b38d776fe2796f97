//! Running statistics over the opponent's moves: frequencies, first-order
//! Markov transitions, higher-order pattern tables, and streak/bias detectors.
//! Every update is O(max_order); every query is a table lookup or a scan of a
//! short window.

use std::collections::HashMap;

use common::model::game::Move;
use itertools::Itertools;

use crate::round::Round;

/// Occurrence count per move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveCounts([u32; 3]);

impl MoveCounts {
    pub fn get(&self, m: Move) -> u32 {
        self.0[m.index()]
    }

    pub fn increment(&mut self, m: Move) {
        self.0[m.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Most frequent move, lowest enum value on ties. `None` when empty.
    pub fn leader(&self) -> Option<Move> {
        let mut best: Option<(Move, u32)> = None;
        for m in Move::ALL {
            let count = self.get(m);
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((m, count));
            }
        }
        best.map(|(m, _)| m)
    }

}

impl FromIterator<Move> for MoveCounts {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut counts = MoveCounts::default();
        for m in iter {
            counts.increment(m);
        }
        counts
    }
}

#[derive(Debug, Clone)]
pub struct OpponentModel {
    moves: Vec<Move>,
    move_counts: MoveCounts,
    transition_counts: [MoveCounts; 3],
    // context (oldest first) -> next move
    pattern_counts: HashMap<Vec<Move>, MoveCounts>,
    max_order: usize,
    default_move: Move,
}

impl OpponentModel {
    pub const DEFAULT_MAX_ORDER: usize = 3;

    pub fn new(max_order: usize, default_move: Move) -> Self {
        OpponentModel {
            moves: Vec::new(),
            move_counts: MoveCounts::default(),
            transition_counts: [MoveCounts::default(); 3],
            pattern_counts: HashMap::new(),
            max_order,
            default_move,
        }
    }

    pub fn update(&mut self, round: &Round) {
        let next = round.opponent_move;
        self.move_counts.increment(next);
        if let Some(previous) = self.current_state() {
            self.transition_counts[previous.index()].increment(next);
        }
        for order in 1..=self.max_order.min(self.moves.len()) {
            let context = self.moves[self.moves.len() - order..].to_vec();
            self.pattern_counts.entry(context).or_default().increment(next);
        }
        self.moves.push(next);
    }

    /// Opponent's last move, `None` before the first completed round.
    pub fn current_state(&self) -> Option<Move> {
        self.moves.last().copied()
    }

    pub fn move_counts(&self) -> &MoveCounts {
        &self.move_counts
    }

    pub fn transitions_from(&self, previous: Move) -> &MoveCounts {
        &self.transition_counts[previous.index()]
    }

    pub fn default_move(&self) -> Move {
        self.default_move
    }

    /// Most likely next move according to the first-order transition table.
    pub fn markov_prediction(&self) -> Option<Move> {
        self.transitions_from(self.current_state()?).leader()
    }

    pub fn predict_next(&self) -> Move {
        self.markov_prediction().unwrap_or(self.default_move)
    }

    /// Next move most often seen after the last `order` opponent moves.
    pub fn pattern_prediction(&self, order: usize) -> Option<Move> {
        if order == 0 || order > self.max_order || order > self.moves.len() {
            return None;
        }
        let context = &self.moves[self.moves.len() - order..];
        self.pattern_counts.get(context)?.leader()
    }

    /// Longest matching context wins.
    pub fn suffix_prediction(&self) -> Option<Move> {
        (1..=self.max_order)
            .rev()
            .find_map(|order| self.pattern_prediction(order))
    }

    /// A move played in strictly more than half of the considered rounds.
    pub fn dominant_move(&self, window: Option<usize>) -> Option<Move> {
        let counts = match window {
            None => self.move_counts,
            Some(window) => self.window(window).iter().copied().collect(),
        };
        let total = counts.total();
        Move::ALL
            .into_iter()
            .find(|&m| total > 0 && 2 * counts.get(m) > total)
    }

    pub fn repeat_streak(&self, length: usize) -> bool {
        length > 0 && self.moves.len() >= length && self.window(length).iter().all_equal()
    }

    /// The repeated move, if the last `length` moves are a streak.
    pub fn streak_move(&self, length: usize) -> Option<Move> {
        if self.repeat_streak(length) {
            self.current_state()
        } else {
            None
        }
    }

    /// Most frequent move in the last `window` rounds. Ties go to the most
    /// recent move when it is among the leaders, otherwise to the lowest enum
    /// value.
    pub fn plurality(&self, window: usize) -> Option<Move> {
        let recent = self.window(window);
        let last = *recent.last()?;
        let counts: MoveCounts = recent.iter().copied().collect();
        let top = Move::ALL.iter().map(|&m| counts.get(m)).max()?;
        let leaders = Move::ALL
            .into_iter()
            .filter(|&m| counts.get(m) == top)
            .collect_vec();
        if leaders.contains(&last) {
            Some(last)
        } else {
            leaders.first().copied()
        }
    }

    fn window(&self, length: usize) -> &[Move] {
        &self.moves[self.moves.len().saturating_sub(length)..]
    }
}

impl Default for OpponentModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ORDER, Move::Rock)
    }
}
