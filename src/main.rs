use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ladle::user_cf::DEFAULT_WORKERS;
use ladle::{data, serialization, QueryConfig, RecipeId, Similarity, UserCf, UserId, UserProfile};

#[derive(Parser)]
#[command(name = "ladle", version)]
#[command(about = "Recommend recipes for a user from everyone else's reviews", long_about = None)]
struct Cli {
    /// User to recommend recipes for.
    user_id: UserId,

    /// Reviews CSV with `rating`, `recipe_id`, `user_id` and `username` columns.
    #[arg(short = 'i', long, default_value = "data/all_users.csv")]
    reviews: PathBuf,

    /// Similarity measure between users.
    #[arg(long, value_enum, default_value_t = Method::Cosine)]
    method: Method,

    /// Impute unrated recipes with the rater's average instead of a near-zero rating.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    impute_average: bool,

    /// Worker threads for the similarity and prediction stages.
    #[arg(
        short = 'p',
        long,
        default_value_t = DEFAULT_WORKERS as u16,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    workers: u16,

    /// How many recommendations to print.
    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,

    /// Explicit candidate recipes; defaults to every recipe the user has not rated.
    #[arg(short = 'r', long = "recipes", num_args = 1..)]
    candidates: Option<Vec<RecipeId>>,

    /// Reuse parsed profiles from this gz cache, creating it on first run.
    #[arg(long)]
    profile_cache: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Cosine,
    Pearson,
}

impl From<Method> for Similarity {
    fn from(method: Method) -> Self {
        match method {
            Method::Cosine => Similarity::Cosine,
            Method::Pearson => Similarity::Pearson,
        }
    }
}

fn load_profiles(cli: &Cli) -> Result<Vec<UserProfile>> {
    match &cli.profile_cache {
        Some(cache) if cache.exists() => serialization::load_model(cache)
            .with_context(|| format!("failed to read profile cache `{}`", cache.display())),
        cache => {
            let profiles = data::load_profiles(&cli.reviews)
                .with_context(|| format!("failed to load reviews from `{}`", cli.reviews.display()))?;
            if let Some(cache) = cache {
                serialization::save_model(&profiles, cache)
                    .with_context(|| format!("failed to write profile cache `{}`", cache.display()))?;
            }
            Ok(profiles)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let profiles = load_profiles(&cli)?;
    let n_users = profiles.len();

    let model = UserCf::new(
        profiles,
        QueryConfig {
            measure: cli.method.into(),
            impute_with_average: cli.impute_average,
            num_workers: usize::from(cli.workers),
        },
    );

    let start = Instant::now();
    let ranked = model.recommend(cli.user_id, cli.candidates.clone())?;
    println!(
        "Filtered {} recipes for user {} (out of {} users) in {:.2?}.",
        ranked.len(),
        cli.user_id,
        n_users,
        start.elapsed()
    );

    let shown = cli.top_k.min(ranked.len());
    println!("Top-{} recipes to recommend for user {}:", shown, cli.user_id);
    for (i, (recipe_id, rating)) in ranked.iter().take(shown).enumerate() {
        println!(
            "{}. Recipe {} with predicted rating {:.5}.",
            i + 1,
            recipe_id,
            rating
        );
    }
    Ok(())
}
