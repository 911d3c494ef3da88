use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use compare::Compare;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{ColgenError, Result};
use crate::misc::job_queue::JobQueue;
use crate::set_partitioning::PricingContext;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricingSettings {
    pub num_threads: usize,
    /// Base seed of the per member random streams
    pub seed: u64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            num_threads: thread::available_parallelism().map_or(1, usize::from),
            seed: 0,
        }
    }
}

/// Pricing of one member, ordered by the dual of its row
#[derive(Clone, Copy, Debug)]
pub struct MemberJob {
    pub member: usize,
    pub priority: f64,
}

/// Higher dual first, lower member index on ties
#[derive(Clone, Copy, Debug, Default)]
pub struct MemberJobComparator;

impl Compare<MemberJob> for MemberJobComparator {
    fn compare(&self, l: &MemberJob, r: &MemberJob) -> Ordering {
        l.priority
            .total_cmp(&r.priority)
            .then_with(|| r.member.cmp(&l.member))
    }
}

/// What a worker knows about the member it prices
pub struct MemberPricingInput<'a> {
    pub member: usize,
    pub duals: &'a [f64],
    pub fixes: &'a [Option<bool>],
    pub pricing_iteration: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PricingSummary {
    pub priced_members: usize,
    pub added_columns: usize,
}

fn member_seed(seed: u64, pricing_iteration: usize, member: usize) -> u64 {
    seed ^ (pricing_iteration as u64).rotate_left(32)
        ^ (member as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Prices every member that is not fully fixed on `num_threads` workers.
///
/// Jobs are taken in order of decreasing member dual. Each member gets its own
/// random stream derived from the seed, the pricing iteration and the member,
/// so results do not depend on the thread that priced it. Columns are added to
/// the pool under a single lock. The first error stops all workers and is
/// returned.
pub fn price_members_in_parallel<F>(
    context: &mut PricingContext<'_>,
    duals: &[f64],
    settings: &PricingSettings,
    price_member: F,
) -> Result<PricingSummary>
where
    F: Fn(&MemberPricingInput<'_>, &mut StdRng) -> Result<Vec<Column>> + Sync,
{
    let number_of_members = context.number_of_members();
    let pricing_iteration = context.pricing_iteration();
    let fixes: Vec<Vec<Option<bool>>> = (0..number_of_members)
        .map(|p| context.fixes_for_member(p).to_vec())
        .collect();

    let queue = JobQueue::new(MemberJobComparator);
    for member in 0..number_of_members {
        if !context.member_fully_fixed(member) {
            queue.add_job(MemberJob {
                member,
                priority: duals[member],
            });
        }
    }
    let num_threads = settings.num_threads.clamp(1, queue.len().max(1));
    log::debug!("pricing {} members on {num_threads} threads", queue.len());

    let context = Mutex::new(context);
    let first_error: Mutex<Option<ColgenError>> = Mutex::new(None);
    let added_columns = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..num_threads {
            s.spawn(|| {
                while let Some(job) = queue.get_job() {
                    let input = MemberPricingInput {
                        member: job.member,
                        duals,
                        fixes: &fixes[job.member],
                        pricing_iteration,
                    };
                    let seed = member_seed(settings.seed, pricing_iteration, job.member);
                    let mut rng = StdRng::seed_from_u64(seed);

                    let result = price_member(&input, &mut rng).and_then(|columns| {
                        let mut context = context.lock().unwrap_or_else(PoisonError::into_inner);
                        let mut added = 0;
                        for column in columns {
                            if context.add_column(column)? {
                                added += 1;
                            }
                        }
                        Ok(added)
                    });

                    match result {
                        Ok(added) => {
                            added_columns.fetch_add(added, AtomicOrdering::SeqCst);
                            queue.job_done();
                        }
                        Err(e) => {
                            let mut slot =
                                first_error.lock().unwrap_or_else(PoisonError::into_inner);
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            queue.flush_and_terminate();
                        }
                    }
                }
            });
        }
    });

    if let Some(e) = first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
        return Err(e);
    }

    Ok(PricingSummary {
        priced_members: queue.completed(),
        added_columns: added_columns.into_inner(),
    })
}
