use crate::identity::RestIdentity;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{sleep, Duration},
};
use tracing::{debug, error, info, warn};

/// Keep the identity token fresh in the background.
///
/// Sleeps for a jittered fraction of the token lifetime, then refreshes,
/// backing off and retrying up to three times per cycle. The task gives up
/// after three consecutive failures; on-demand refresh in
/// `identity_token` still covers callers after that.
pub fn spawn_refresh(identity: Arc<RestIdentity>, lease_duration: u64) -> JoinHandle<()> {
    let mut rng = StdRng::from_entropy();

    let mut jittered_lease_duration = jitter(&mut rng, lease_duration);

    tokio::spawn(async move {
        loop {
            sleep(Duration::from_secs(jittered_lease_duration)).await;

            for attempt in 1..=3 {
                let backoff_time = 2u64.pow(attempt - 1);

                if attempt > 1 {
                    warn!("Backing off for {} seconds", backoff_time);
                    sleep(Duration::from_secs(backoff_time)).await;
                }

                match identity.refresh_session().await {
                    Ok(lease_duration) => {
                        debug!("token lease duration {} seconds", lease_duration);

                        jittered_lease_duration = jitter(&mut rng, lease_duration);

                        break;
                    }

                    Err(e) => {
                        error!("Error refreshing token: {}", e);

                        if attempt == 3 {
                            error!("Failed to refresh token after 3 attempts");
                            return;
                        }

                        continue;
                    }
                }
            }

            info!("Will refresh token in {} seconds", jittered_lease_duration);
        }
    })
}

fn jitter(rng: &mut StdRng, lease_duration: u64) -> u64 {
    let jittered = (lease_duration as f64 * rng.gen_range(0.7..0.9)) as u64;
    jittered.max(1)
}
