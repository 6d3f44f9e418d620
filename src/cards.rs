use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A card is just its index in the deck. Attributes are left to the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card(pub u32);

impl fmt::Display for Card {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "P{}", self.0)
	}
}

/// Cards not currently on the table. Order carries no meaning, every draw is
/// uniform over what is left.
#[derive(Debug, Clone, Default)]
pub struct Deck {
	cards: Vec<Card>,
}

impl Deck {
	pub fn full(size: u32) -> Self {
		Self {
			cards: (0..size).map(Card).collect(),
		}
	}

	pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<Card> {
		if self.cards.is_empty() {
			return None;
		}
		let idx = rng.random_range(0..self.cards.len());
		Some(self.cards.swap_remove(idx))
	}

	pub fn put_back(&mut self, card: Card) {
		self.cards.push(card);
	}

	pub fn len(&self) -> usize {
		self.cards.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cards.is_empty()
	}

	pub fn contains(&self, card: Card) -> bool {
		self.cards.contains(&card)
	}

	pub fn cards(&self) -> &[Card] {
		&self.cards
	}
}
