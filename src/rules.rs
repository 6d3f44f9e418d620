use crate::cards::Card;

/// Decides what a set is. The dealer calls it synchronously, so implementations
/// must be pure.
pub trait SetRules: Send + Sync {
	/// Number of cards in a set.
	fn set_size(&self) -> usize;

	fn is_valid_set(&self, cards: &[Card]) -> bool;

	/// Up to `limit` sets found among `cards`.
	fn find_sets(&self, cards: &[Card], limit: usize) -> Vec<Vec<Card>> {
		let mut found = Vec::new();
		let k = self.set_size();
		if limit == 0 || k == 0 || cards.len() < k {
			return found;
		}

		let mut picked: Vec<usize> = (0..k).collect();
		loop {
			let group: Vec<Card> = picked.iter().map(|&i| cards[i]).collect();
			if self.is_valid_set(&group) {
				found.push(group);
				if found.len() >= limit {
					return found;
				}
			}
			if !next_combination(&mut picked, cards.len()) {
				return found;
			}
		}
	}

	fn any_set_exists(&self, cards: &[Card]) -> bool {
		!self.find_sets(cards, 1).is_empty()
	}
}

// Advances `picked` to the next k-combination of 0..n in lexicographic order.
fn next_combination(picked: &mut [usize], n: usize) -> bool {
	let k = picked.len();
	let mut i = k;
	while i > 0 {
		i -= 1;
		if picked[i] < n - k + i {
			picked[i] += 1;
			for j in i + 1..k {
				picked[j] = picked[j - 1] + 1;
			}
			return true;
		}
	}
	false
}

/// The classic attribute rule: a card id written in base `values` gives
/// `features` attributes, and `values` cards form a set when every attribute
/// is either all equal or all different across them.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRules {
	features: u32,
	values: u32,
}

impl FeatureRules {
	pub fn new(features: u32, values: u32) -> Self {
		Self { features, values }
	}

	pub fn deck_size(&self) -> u32 {
		self.values.pow(self.features)
	}

	pub fn attributes(&self, card: Card) -> Vec<u32> {
		let mut id = card.0;
		(0..self.features)
			.map(|_| {
				let v = id % self.values;
				id /= self.values;
				v
			})
			.collect()
	}
}

impl SetRules for FeatureRules {
	fn set_size(&self) -> usize {
		self.values as usize
	}

	fn is_valid_set(&self, cards: &[Card]) -> bool {
		if cards.len() != self.set_size() {
			return false;
		}
		let attrs: Vec<Vec<u32>> = cards.iter().map(|&c| self.attributes(c)).collect();
		(0..self.features as usize).all(|f| {
			let mut seen: Vec<u32> = attrs.iter().map(|a| a[f]).collect();
			seen.sort_unstable();
			seen.dedup();
			seen.len() == 1 || seen.len() == cards.len()
		})
	}
}
