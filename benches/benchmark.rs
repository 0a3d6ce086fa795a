use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::thread_rng;
use score_voting::crypto::group::Point;
use score_voting::crypto::keys::{generate_key_pair, voter_keys};
use score_voting::crypto::tally::{decryption_share, tally_scores};
use score_voting::{
    build_commit_args, build_commit_args_parallel, verify_commit_args, CommitArgs, GroupContext, KeyPair, ScoreRange,
    Secp256k1,
};

fn create_voters(ctx: &GroupContext<Secp256k1>, num_voters: usize) -> (Vec<KeyPair<Secp256k1>>, Vec<Point<Secp256k1>>) {
    let key_pairs: Vec<_> = (0..num_voters)
        .map(|_| generate_key_pair(ctx, &mut thread_rng()))
        .collect();
    let public_keys = key_pairs.iter().map(|kp| kp.public_key).collect();
    (key_pairs, public_keys)
}

fn create_ballots(
    ctx: &GroupContext<Secp256k1>,
    key_pairs: &[KeyPair<Secp256k1>],
    public_keys: &[Point<Secp256k1>],
    num_candidates: usize,
    range: ScoreRange,
) -> Vec<CommitArgs<Secp256k1>> {
    key_pairs
        .iter()
        .enumerate()
        .map(|(i, kp)| {
            let scores: Vec<i64> = (0..num_candidates)
                .map(|c| ((i + c) as i64) % (range.max_score + 1))
                .collect();
            build_commit_args(ctx, &kp.private_key, &scores, public_keys, i, num_candidates, range, &mut thread_rng())
                .unwrap()
        })
        .collect()
}

fn benchmark_score_voting(c: &mut Criterion) {
    let ctx = GroupContext::<Secp256k1>::new().unwrap();
    let range = ScoreRange::default();

    // Create a benchmark group
    let mut group = c.benchmark_group("Score Voting (secp256k1)");
    group.sample_size(10);

    let num_voters = 8;
    let (key_pairs, public_keys) = create_voters(&ctx, num_voters);

    for num_candidates in [2, 4, 8] {
        let scores: Vec<i64> = (0..num_candidates).map(|c| (c as i64) % 6).collect();

        group.bench_with_input(BenchmarkId::new("(Voter) commit args", format!("candidates: {}", num_candidates)), &num_candidates, |b, _cfg| {
            b.iter(|| {
                let args = build_commit_args(&ctx, &key_pairs[0].private_key, &scores, &public_keys, 0, num_candidates, range, &mut thread_rng()).unwrap();
                black_box(args);
            });
        });

        group.bench_with_input(BenchmarkId::new("(Voter) commit args, parallel", format!("candidates: {}", num_candidates)), &num_candidates, |b, _cfg| {
            b.iter(|| {
                let args = build_commit_args_parallel(&ctx, &key_pairs[0].private_key, &scores, &public_keys, 0, num_candidates, range, &mut thread_rng()).unwrap();
                black_box(args);
            });
        });

        let args = build_commit_args(&ctx, &key_pairs[0].private_key, &scores, &public_keys, 0, num_candidates, range, &mut thread_rng()).unwrap();
        println!("Submission size: {} words, candidates: {}", {
            let wire = args.to_wire();
            wire.xis.len() + wire.nus.len() + wire.proof1.iter().map(Vec::len).sum::<usize>() + wire.proof2.len() + wire.w_i.len()
        }, num_candidates);

        // ledger verifies a single submission
        group.bench_with_input(BenchmarkId::new("(Ledger) commit args verification", format!("candidates: {}", num_candidates)), &num_candidates, |b, _cfg| {
            b.iter(|| {
                assert!(verify_commit_args(&ctx, &public_keys, 0, &args, range).is_ok());
            });
        });

        let ballots = create_ballots(&ctx, &key_pairs, &public_keys, num_candidates, range);
        let registrations: Vec<_> = key_pairs
            .iter()
            .enumerate()
            .map(|(j, kp)| voter_keys(&ctx, kp, num_candidates, num_voters, j, &mut thread_rng()).unwrap())
            .collect();
        let tally_keys: Vec<_> = registrations.iter().map(|r| r.ys.clone()).collect();
        let shares: Vec<_> = key_pairs
            .iter()
            .zip(&registrations)
            .enumerate()
            .map(|(j, (kp, r))| decryption_share(&ctx, kp, &r.xs, j, &ballots, &tally_keys, &mut thread_rng()).unwrap())
            .collect();

        group.bench_with_input(BenchmarkId::new("(Anyone) tally", format!("candidates: {}, voters: {}", num_candidates, num_voters)), &num_candidates, |b, _cfg| {
            b.iter(|| {
                let totals = tally_scores(&ctx, &public_keys, &tally_keys, &ballots, &shares, range).unwrap();
                black_box(totals);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_score_voting);
criterion_main!(benches);
