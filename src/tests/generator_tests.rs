//! Generator tests driven by a scripted clock.

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::tests::test_utils::FakeClock;
    use crate::{ConfigError, UidConfig, UidError, UidGenerator};

    const EPOCH: u64 = 1_463_702_400_000; // 2016-05-20T00:00:00Z

    fn generator_at(millis: u64) -> (UidGenerator<FakeClock>, FakeClock) {
        let clock = FakeClock::new(millis);
        let generator = UidGenerator::with_clock(UidConfig::default(), clock.clone()).unwrap();
        (generator, clock)
    }

    #[test]
    fn test_first_uid_has_sequence_zero() {
        let (generator, _clock) = generator_at(EPOCH + 1000);
        let uid = generator.get_uid().unwrap();
        let (delta, worker_id, sequence) = generator.decompose(uid).unwrap();
        assert_eq!(delta, 1000);
        assert_eq!(worker_id, 1);
        assert_eq!(sequence, 0);
    }

    #[test]
    fn test_same_millisecond_increments_sequence() {
        let (generator, _clock) = generator_at(EPOCH + 1000);
        let first = generator.get_uid().unwrap();
        let second = generator.get_uid().unwrap();
        let (_, _, seq1) = generator.decompose(first).unwrap();
        let (_, _, seq2) = generator.decompose(second).unwrap();
        assert_eq!(seq2, seq1 + 1);
        assert!(second > first);
    }

    #[test]
    fn test_millisecond_advance_resets_sequence() {
        let (generator, clock) = generator_at(EPOCH + 1000);
        for _ in 0..5 {
            generator.get_uid().unwrap();
        }
        clock.advance(1);
        let uid = generator.get_uid().unwrap();
        let (delta, _, sequence) = generator.decompose(uid).unwrap();
        assert_eq!(delta, 1001);
        assert_eq!(sequence, 0);
    }

    #[test]
    fn test_clock_regression_rejected_and_state_unchanged() {
        let (generator, clock) = generator_at(EPOCH + 1000);
        let before = generator.get_uid().unwrap();

        clock.set(EPOCH + 995);
        let err = generator.get_uid().unwrap_err();
        assert_eq!(err, UidError::ClockMovedBackwards { delta: 5 });

        // last_millis and sequence are untouched: back at the original
        // millisecond the sequence continues where it left off.
        clock.set(EPOCH + 1000);
        let after = generator.get_uid().unwrap();
        let (_, _, seq_before) = generator.decompose(before).unwrap();
        let (_, _, seq_after) = generator.decompose(after).unwrap();
        assert_eq!(seq_after, seq_before + 1);
    }

    #[test]
    fn test_timestamp_budget_exhausted() {
        // One timestamp bit: the budget runs out two milliseconds past epoch.
        let config = UidConfig::builder()
            .timestamp_bits(1)
            .worker_bits(30)
            .sequence_bits(32)
            .epoch_millis(0)
            .build()
            .unwrap();
        let clock = FakeClock::new(100);
        let generator = UidGenerator::with_clock(config, clock).unwrap();
        let err = generator.get_uid().unwrap_err();
        assert_eq!(err, UidError::TimestampExhausted { now: 100, epoch: 0 });
    }

    #[test]
    fn test_sequence_exhaustion_waits_for_clock() {
        // Two sequence bits: four UIDs per millisecond.
        let config = UidConfig::builder()
            .timestamp_bits(41)
            .worker_bits(20)
            .sequence_bits(2)
            .worker_id(3)
            .epoch_millis(EPOCH)
            .build()
            .unwrap();
        let clock = FakeClock::new(EPOCH + 10);
        let generator = UidGenerator::with_clock(config, clock.clone()).unwrap();

        for expected_seq in 0..4 {
            let uid = generator.get_uid().unwrap();
            let (_, _, sequence) = generator.decompose(uid).unwrap();
            assert_eq!(sequence, expected_seq);
        }

        // The fifth wraps the sequence; with a frozen clock the busy-poll
        // cannot complete, so the deadline fires.
        let deadline = Instant::now() + Duration::from_millis(20);
        let err = generator.get_uid_before(deadline).unwrap_err();
        assert_eq!(err, UidError::DeadlineExceeded);

        // The failed wait consumed no sequence space: a retry in the same
        // millisecond waits again rather than reissuing sequence 0..3.
        let deadline = Instant::now() + Duration::from_millis(5);
        assert_eq!(
            generator.get_uid_before(deadline).unwrap_err(),
            UidError::DeadlineExceeded
        );

        // Once the clock ticks, issuance resumes at sequence 0.
        clock.advance(1);
        let uid = generator.get_uid().unwrap();
        let (delta, _, sequence) = generator.decompose(uid).unwrap();
        assert_eq!(delta, 11);
        assert_eq!(sequence, 0);
    }

    #[test]
    fn test_sequence_exhaustion_resumes_after_tick() {
        let config = UidConfig::builder()
            .timestamp_bits(41)
            .worker_bits(20)
            .sequence_bits(2)
            .epoch_millis(EPOCH)
            .build()
            .unwrap();
        let clock = FakeClock::new(EPOCH + 10);
        let generator = UidGenerator::with_clock(config, clock.clone()).unwrap();

        for _ in 0..4 {
            generator.get_uid().unwrap();
        }

        // Tick the clock from another thread while the generator spins.
        let ticker = {
            let clock = clock.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(5));
                clock.advance(1);
            })
        };
        let uid = generator.get_uid().unwrap();
        ticker.join().unwrap();

        let (delta, _, sequence) = generator.decompose(uid).unwrap();
        assert_eq!(delta, 11);
        assert_eq!(sequence, 0);
    }

    #[test]
    fn test_parse_uid_format() {
        let (generator, _clock) = generator_at(EPOCH + 5 * 86_400_000);
        let uid = generator.get_uid().unwrap();
        assert_eq!(
            generator.parse_uid(uid).unwrap(),
            format!("UID:{uid}, timestamp:2016-05-25, workerId:1, sequence:0")
        );
    }

    #[test]
    fn test_parse_recovers_configured_worker_id() {
        let config = UidConfig::builder().worker_id(777).build().unwrap();
        let clock = FakeClock::new(EPOCH + 123);
        let generator = UidGenerator::with_clock(config, clock).unwrap();
        let uid = generator.get_uid().unwrap();
        let (_, worker_id, _) = generator.decompose(uid).unwrap();
        assert_eq!(worker_id, 777);
    }

    #[test]
    fn test_set_worker_id() {
        let (generator, _clock) = generator_at(EPOCH + 1);
        generator.set_worker_id(42).unwrap();
        assert_eq!(generator.worker_id().unwrap(), 42);

        let uid = generator.get_uid().unwrap();
        let (_, worker_id, _) = generator.decompose(uid).unwrap();
        assert_eq!(worker_id, 42);

        let err = generator.set_worker_id(1024).unwrap_err();
        assert_eq!(
            err,
            UidError::Config(ConfigError::InvalidWorkerId {
                worker_id: 1024,
                max: 1023
            })
        );
    }

    #[test]
    fn test_set_epoch() {
        let (generator, _clock) = generator_at(EPOCH + 1);
        generator.set_epoch("2020-01-01").unwrap();
        assert_eq!(generator.epoch_millis().unwrap(), 1_577_836_800_000);

        let err = generator.set_epoch("not-a-date").unwrap_err();
        assert!(matches!(
            err,
            UidError::Config(ConfigError::InvalidEpochDate { .. })
        ));
    }

    #[test]
    fn test_bit_width_setters_validate_against_current_layout() {
        let (generator, _clock) = generator_at(EPOCH + 1);

        // A width that breaks the 64-bit sum against the other current
        // widths is rejected and the layout stays untouched.
        let err = generator.set_worker_bits(12).unwrap_err();
        assert!(matches!(
            err,
            UidError::Config(ConfigError::BitsSumMismatch { .. })
        ));
        generator.set_sequence_bits(10).unwrap_err();
        generator.set_timestamp_bits(64).unwrap_err();

        let layout = generator.layout().unwrap();
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.worker_bits(), 10);
        assert_eq!(layout.sequence_bits(), 12);

        // Re-applying the current width is a valid no-op rebuild.
        generator.set_timestamp_bits(41).unwrap();
        assert_eq!(generator.layout().unwrap().timestamp_bits(), 41);
    }

    #[test]
    fn test_narrowing_worker_bits_rejected_before_worker_id_orphaned() {
        let config = UidConfig::builder()
            .timestamp_bits(39)
            .worker_bits(12)
            .sequence_bits(12)
            .worker_id(2048)
            .build()
            .unwrap();
        let generator = UidGenerator::with_clock(config, FakeClock::new(EPOCH + 1)).unwrap();

        // Narrowing the worker field alone breaks the 64-bit sum, so the
        // rebuild is rejected and worker_id 2048 is never orphaned.
        generator.set_worker_bits(10).unwrap_err();
        assert_eq!(generator.worker_id().unwrap(), 2048);
        assert_eq!(generator.layout().unwrap().worker_bits(), 12);
    }

    #[test]
    fn test_system_clock_timestamp_close_to_now() {
        let generator = UidGenerator::new().unwrap();
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let uid = generator.get_uid().unwrap();
        let (delta, _, _) = generator.decompose(uid).unwrap();
        let timestamp = generator.epoch_millis().unwrap() + delta;
        assert!(timestamp + 1 >= before);
        assert!(timestamp <= before + 1000);
    }

    #[test]
    fn test_monotonic_within_worker() {
        let (generator, clock) = generator_at(EPOCH + 1000);
        let mut last = 0u64;
        for i in 0..1000 {
            if i % 100 == 0 {
                clock.advance(1);
            }
            let uid = generator.get_uid().unwrap();
            assert!(uid > last, "UID {uid} not greater than previous {last}");
            last = uid;
        }
    }
}
