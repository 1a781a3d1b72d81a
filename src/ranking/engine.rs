//! Ranking engine
//!
//! Ties the store, the rating calculator and the pairing selector together.
//! Every operation takes an explicit `RequestContext` and only ever touches
//! the data of that context's user.

use crate::error::{RankingError, Result};
use crate::rating::{PairingSelector, RatingCalculator};
use crate::ranking::ingest::read_first_column;
use crate::store::CourseStore;
use crate::types::{
    ImportSummary, Item, ItemPair, ItemRating, RankingEntry, RatingUpdate, RequestContext,
    VoteOutcome,
};
use crate::utils::{display_rating, normalize_item_name};
use std::cmp::Ordering;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-user course ranking driven by pairwise votes
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn CourseStore>,
    calculator: Arc<dyn RatingCalculator>,
    selector: Arc<dyn PairingSelector>,
}

impl RankingEngine {
    pub fn new(
        store: Arc<dyn CourseStore>,
        calculator: Arc<dyn RatingCalculator>,
        selector: Arc<dyn PairingSelector>,
    ) -> Self {
        Self {
            store,
            calculator,
            selector,
        }
    }

    /// Current calculator configuration, for diagnostics
    pub fn calculator_config(&self) -> serde_json::Value {
        self.calculator.config()
    }

    /// Pick two distinct courses for the user to compare
    pub fn next_pair(&self, ctx: &RequestContext) -> Result<ItemPair> {
        let items = self.store.list_for_user(ctx.user_id)?;
        let pair = self.selector.select_pair(&items)?;

        debug!(
            "Pair for user {}: '{}' vs '{}'",
            ctx.user_id, pair.first.name, pair.second.name
        );
        Ok(pair)
    }

    /// Record that `winner_name` was preferred over `loser_name`
    ///
    /// Both ratings are written in one atomic store call; any failure leaves
    /// them unchanged.
    pub fn record_vote(
        &self,
        ctx: &RequestContext,
        winner_name: &str,
        loser_name: &str,
    ) -> Result<VoteOutcome> {
        if winner_name == loser_name {
            return Err(RankingError::SelfComparison {
                name: winner_name.to_string(),
            }
            .into());
        }

        let winner = self.resolve_item(ctx, winner_name)?;
        let loser = self.resolve_item(ctx, loser_name)?;
        let winner_rating = self.rating_of(ctx, &winner)?;
        let loser_rating = self.rating_of(ctx, &loser)?;

        let outcome = self
            .calculator
            .calculate_rating_changes(&winner_rating, &loser_rating)?;

        self.store.store_ratings(
            ctx.user_id,
            &[
                RatingUpdate {
                    item_id: outcome.winner.item_id,
                    rating: outcome.winner.new_rating,
                },
                RatingUpdate {
                    item_id: outcome.loser.item_id,
                    rating: outcome.loser.new_rating,
                },
            ],
        )?;

        info!(
            "Vote recorded for user {}: '{}' {:.1} -> {:.1}, '{}' {:.1} -> {:.1}",
            ctx.user_id,
            winner.name,
            outcome.winner.old_rating,
            outcome.winner.new_rating,
            loser.name,
            outcome.loser.old_rating,
            outcome.loser.new_rating
        );
        Ok(outcome)
    }

    /// The user's courses ordered by rating, highest first
    ///
    /// Equal ratings keep creation order.
    pub fn rankings(&self, ctx: &RequestContext) -> Result<Vec<RankingEntry>> {
        let mut rated = self.store.rated_items_for_user(ctx.user_id)?;

        rated.sort_by(|a, b| {
            b.rating
                .rating
                .partial_cmp(&a.rating.rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        Ok(rated
            .into_iter()
            .map(|entry| RankingEntry {
                name: entry.item.name,
                rating: display_rating(entry.rating.rating),
            })
            .collect())
    }

    /// Add a single course with the default rating
    pub fn add_item(&self, ctx: &RequestContext, raw_name: &str) -> Result<Item> {
        let name = normalize_item_name(raw_name).ok_or_else(|| RankingError::InvalidItemName {
            reason: "Course name cannot be empty".to_string(),
        })?;

        if self.store.find_by_name_for_user(ctx.user_id, name)?.is_some() {
            return Err(RankingError::AlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        let item = self
            .store
            .create(ctx.user_id, name, self.calculator.initial_rating())?;
        info!("User {} added course '{}'", ctx.user_id, item.name);
        Ok(item)
    }

    /// Add every new course named in the first column of a CSV document
    pub fn import_csv<R: Read>(&self, ctx: &RequestContext, reader: R) -> Result<ImportSummary> {
        let cells = read_first_column(reader)?;
        let mut summary = ImportSummary::default();

        for cell in &cells {
            let Some(name) = normalize_item_name(cell) else {
                summary.skipped_blank += 1;
                continue;
            };

            if self.store.find_by_name_for_user(ctx.user_id, name)?.is_some() {
                summary.skipped_existing += 1;
                continue;
            }

            match self
                .store
                .create(ctx.user_id, name, self.calculator.initial_rating())
            {
                Ok(_) => summary.added += 1,
                Err(err)
                    if matches!(
                        RankingError::find(&err),
                        Some(RankingError::AlreadyExists { .. })
                    ) =>
                {
                    summary.skipped_existing += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "CSV import for user {}: {} added, {} already present, {} blank",
            ctx.user_id, summary.added, summary.skipped_existing, summary.skipped_blank
        );
        Ok(summary)
    }

    fn resolve_item(&self, ctx: &RequestContext, name: &str) -> Result<Item> {
        let item = self
            .store
            .find_by_name_for_user(ctx.user_id, name)?
            .ok_or_else(|| RankingError::ItemNotFound {
                name: name.to_string(),
            })?;

        if item.user_id != ctx.user_id {
            warn!(
                "Store returned course {} of user {} for user {}",
                item.id, item.user_id, ctx.user_id
            );
            return Err(RankingError::CrossUserReference { item_id: item.id }.into());
        }

        Ok(item)
    }

    fn rating_of(&self, ctx: &RequestContext, item: &Item) -> Result<ItemRating> {
        self.store
            .rating_for_item(ctx.user_id, item.id)?
            .ok_or_else(|| {
                RankingError::Storage {
                    message: format!("Course '{}' has no rating", item.name),
                }
                .into()
            })
    }
}
