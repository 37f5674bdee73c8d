#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::{Duration, Instant};

    use crate::clock::{Clock, SystemClock, TickClock};
    use crate::config::SearchConfig;
    use crate::diagnostics::{alphabeta, minimax, negamax};
    use crate::error::GameError;
    use crate::heuristics::{self, Heuristic, HeuristicEvaluator, WIN_SCORE};
    use crate::solver::{win_score, MoveOrdering, Solver};
    use crate::state::{Direction, Move, Side, Square, State};
    use crate::transposition_table::{Bound, TranspositionTable};

    const ORDERINGS: [MoveOrdering; 3] = [
        MoveOrdering::Unordered,
        MoveOrdering::HeuristicSorted,
        MoveOrdering::Random,
    ];

    const DETERMINISTIC_HEURISTICS: [Heuristic; 6] = [
        Heuristic::Default,
        Heuristic::WinLoss,
        Heuristic::ThreeInARow,
        Heuristic::Cluster,
        Heuristic::CenterDistance,
        Heuristic::Mobility,
    ];

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn position(white: &[(usize, usize)], black: &[(usize, usize)]) -> Result<State> {
        let to_squares = |squares: &[(usize, usize)]| -> Vec<Square> {
            squares.iter().map(|&(c, r)| Square::new(c, r)).collect()
        };
        Ok(State::new(to_squares(white), to_squares(black))?)
    }

    fn moves(notation: &[&str]) -> Result<Vec<Move>> {
        notation.iter().map(|m| Ok(m.parse::<Move>()?)).collect()
    }

    // three White pieces on row 2 with a fourth one square below the open end
    fn three_in_a_row() -> Result<State> {
        position(
            &[(2, 2), (3, 2), (4, 2), (5, 3), (0, 0), (6, 0)],
            &[(0, 6), (2, 6), (4, 6), (6, 6), (1, 5), (5, 5)],
        )
    }

    fn midgame() -> Result<State> {
        position(
            &[(2, 2), (3, 3), (4, 2), (2, 4), (5, 5), (1, 1)],
            &[(3, 2), (2, 3), (4, 4), (3, 4), (1, 5), (5, 1)],
        )
    }

    // the start position, a hand made middle game, and a few plies of play from the start
    fn sample_positions() -> Result<Vec<(State, Side)>> {
        let mut positions = vec![(State::initial(), Side::White), (midgame()?, Side::Black)];
        let (mut state, mut side) = (State::initial(), Side::White);
        for k in 0..6 {
            let legal = state.legal_moves(side);
            let chosen = legal[(3 * k + 1) % legal.len()];
            state = state.apply(chosen)?;
            side = side.opponent();
            positions.push((state, side));
        }
        Ok(positions)
    }

    fn unlimited() -> SearchConfig {
        SearchConfig::default()
            .with_time_limit(f64::INFINITY)
            .with_table_size(1 << 16)
    }

    #[test]
    pub fn initial_legal_moves() -> Result<()> {
        let state = State::initial();

        let white = moves(&["13E", "15E", "17E", "72W", "74W", "76W", "76S"])?;
        assert_eq!(state.legal_moves(Side::White), white);

        let black = moves(&["12E", "12N", "14E", "16E", "71W", "73W", "75W"])?;
        assert_eq!(state.legal_moves(Side::Black), black);

        assert_eq!(state.piece_count(Side::White), 6);
        assert_eq!(state.piece_count(Side::Black), 6);
        Ok(())
    }

    #[test]
    pub fn apply_moves() -> Result<()> {
        let state = State::initial();
        let next = state.apply("13E".parse()?)?;

        assert_eq!(next.owner(Square::new(1, 2)), Some(Side::White));
        assert_eq!(next.owner(Square::new(0, 2)), None);
        assert_eq!(next.mask(Side::Black), state.mask(Side::Black));
        assert_eq!(next.piece_count(Side::White), 6);
        assert!(next.pieces(Side::White).any(|square| square == Square::new(1, 2)));
        // the original position is untouched
        assert_eq!(state.owner(Square::new(0, 2)), Some(Side::White));

        // the mover is the owner of the piece, Black here
        let next = state.apply("71W".parse()?)?;
        assert_eq!(next.owner(Square::new(5, 0)), Some(Side::Black));
        assert_eq!(next.mask(Side::White), state.mask(Side::White));

        // successors agree with applying each legal move
        for (legal_move, child) in state.successors(Side::White) {
            assert_eq!(state.apply(legal_move)?, child);
        }
        Ok(())
    }

    #[test]
    pub fn illegal_moves() -> Result<()> {
        let state = State::initial();
        for notation in &["13N", "44E", "17S", "11W"] {
            let illegal: Move = notation.parse()?;
            match state.apply(illegal) {
                Err(GameError::IllegalMove { mv, .. }) => assert_eq!(mv, illegal),
                other => return Err(anyhow!("{} should be illegal, got {:?}", notation, other)),
            }
        }
        Ok(())
    }

    #[test]
    pub fn move_notation() -> Result<()> {
        let parsed: Move = "13E".parse()?;
        assert_eq!(parsed, Move::new(Square::new(0, 2), Direction::East));
        assert_eq!(parsed.to_string(), "13E");
        assert_eq!(parsed.destination(), Some(Square::new(1, 2)));

        let edge: Move = "77S".parse()?;
        assert_eq!(edge.destination(), None);

        for invalid in &["83E", "08N", "1E", "13Q", "13E4", ""] {
            assert!(invalid.parse::<Move>().is_err(), "{} parsed", invalid);
        }
        Ok(())
    }

    #[test]
    pub fn state_validation() {
        let square = |c, r| Square::new(c, r);

        assert_eq!(
            State::new(vec![square(1, 1)], vec![square(1, 1)]),
            Err(GameError::Overlap(square(1, 1)))
        );
        assert_eq!(
            State::new(vec![square(1, 1), square(1, 1)], Vec::new()),
            Err(GameError::DuplicatePiece(square(1, 1)))
        );
        assert_eq!(
            State::new(vec![square(7, 0)], Vec::new()),
            Err(GameError::OutOfBounds { column: 7, row: 0 })
        );
        assert!(!square(7, 0).in_bounds());
        assert!(square(6, 6).in_bounds());
        assert!(State::new(vec![square(6, 6)], vec![square(0, 0)]).is_ok());
    }

    #[test]
    pub fn alignments() -> Result<()> {
        let cases: [(&[(usize, usize)], bool); 7] = [
            (&[(0, 0), (1, 0), (2, 0), (3, 0)], true),
            (&[(4, 3), (4, 4), (4, 5), (4, 6)], true),
            (&[(0, 0), (1, 1), (2, 2), (3, 3)], true),
            (&[(6, 0), (5, 1), (4, 2), (3, 3)], true),
            (&[(0, 0), (1, 0), (2, 0), (4, 0)], false),
            // a column must not run over into the next one
            (&[(0, 5), (0, 6), (1, 0), (1, 1)], false),
            (&[(5, 6), (6, 6), (0, 6), (1, 6)], false),
        ];
        for (white, won) in cases.iter() {
            let state = position(white, &[])?;
            assert_eq!(state.is_terminal_win(Side::White), *won, "{:?}", white);
            assert!(!state.is_terminal_win(Side::Black));
            assert_eq!(state.winner(), if *won { Some(Side::White) } else { None });
            assert_eq!(state.swapped().winner(), if *won { Some(Side::Black) } else { None });
        }
        Ok(())
    }

    #[test]
    pub fn heuristics_are_antisymmetric() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        for (state, _) in sample_positions()? {
            for &heuristic in DETERMINISTIC_HEURISTICS.iter() {
                let score = heuristic.evaluate_with(&state, &mut rng);
                let swapped = heuristic.evaluate_with(&state.swapped(), &mut rng);
                assert_eq!(swapped, -score, "{:?}\n{}", heuristic, state);
                assert!(!heuristics::is_decided(score));
            }
        }
        Ok(())
    }

    #[test]
    pub fn heuristic_values() -> Result<()> {
        let state = three_in_a_row()?;
        assert!(heuristics::in_a_row(&state) > 0);
        assert_eq!(heuristics::three_in_a_row(&state), 1);
        assert_eq!(heuristics::win_loss(&state), 0);

        let won = state.apply("64N".parse()?)?;
        assert_eq!(heuristics::win_loss(&won), WIN_SCORE);
        assert_eq!(heuristics::win_loss(&won.swapped()), -WIN_SCORE);
        assert!(heuristics::is_decided(heuristics::win_loss(&won)));

        // the start position is symmetric
        assert_eq!(heuristics::mobility(&State::initial()), 0);
        assert_eq!(heuristics::center_distance(&State::initial()), 0);
        Ok(())
    }

    #[test]
    pub fn random_heuristic_is_seeded() {
        let state = State::initial();
        let mut first = HeuristicEvaluator::new(Heuristic::Random, 42);
        let mut second = HeuristicEvaluator::new(Heuristic::Random, 42);
        for _ in 0..100 {
            let score = heuristics::Evaluator::evaluate(&mut first, &state);
            assert_eq!(score, heuristics::Evaluator::evaluate(&mut second, &state));
            assert!(!heuristics::is_decided(score));
        }
        assert!(!Heuristic::Random.is_deterministic());
        assert!(Heuristic::Default.is_deterministic());
    }

    #[test]
    pub fn transposition_table_depth() {
        let mut table = TranspositionTable::with_size(1024);
        let state = State::initial();
        let best = Some(Move::new(Square::new(0, 2), Direction::East));

        assert!(table.lookup(&state, Side::White, 0).is_none());
        table.store(&state, Side::White, 3, 42, Bound::LowerBound, best);

        let entry = table.lookup(&state, Side::White, 3).expect("stored entry");
        assert_eq!((entry.score, entry.bound, entry.best_move), (42, Bound::LowerBound, best));
        assert!(table.lookup(&state, Side::White, 1).is_some());
        // too shallow for a deeper query
        assert!(table.lookup(&state, Side::White, 4).is_none());
        // the side to move is part of the key
        assert!(table.lookup(&state, Side::Black, 0).is_none());

        // storing always overwrites, even with a shallower result
        table.store(&state, Side::White, 1, -5, Bound::Exact, None);
        assert!(table.lookup(&state, Side::White, 3).is_none());
        assert_eq!(table.lookup(&state, Side::White, 1).map(|e| e.score), Some(-5));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    pub fn transposition_table_collisions() -> Result<()> {
        let mut table = TranspositionTable::with_size(1);
        let first = State::initial();
        let second = first.apply("13E".parse()?)?;

        table.store(&first, Side::White, 2, 10, Bound::Exact, None);
        table.store(&second, Side::Black, 2, 20, Bound::Exact, None);

        // the second store evicted the first, which now misses rather than
        // returning the wrong score
        assert!(table.lookup(&first, Side::White, 0).is_none());
        assert_eq!(table.lookup(&second, Side::Black, 2).map(|e| e.score), Some(20));
        assert_eq!(table.capacity(), 1);
        Ok(())
    }

    #[test]
    pub fn pruning_equivalence() -> Result<()> {
        let mut evaluator = HeuristicEvaluator::from(Heuristic::Default);
        for (state, side) in sample_positions()? {
            for depth in 0..=3 {
                let exhaustive = minimax(&state, depth, side, &mut evaluator);

                let pruned = alphabeta(&state, depth, side, &mut evaluator);
                assert_eq!(pruned.value, exhaustive.value);
                assert!(pruned.nodes <= exhaustive.nodes);

                for &ordering in ORDERINGS.iter() {
                    for &use_table in [false, true].iter() {
                        let result =
                            negamax(&state, depth, side, &mut evaluator, ordering, use_table);
                        assert_eq!(
                            side.color() * result.value,
                            exhaustive.value,
                            "{:?} table: {} depth: {}\n{}",
                            ordering,
                            use_table,
                            depth,
                            state
                        );
                        assert!(result.nodes <= exhaustive.nodes);
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn table_transparency() -> Result<()> {
        let mut evaluator = HeuristicEvaluator::from(Heuristic::Default);
        let positions = vec![(State::initial(), Side::White), (midgame()?, Side::White)];
        for (state, side) in positions {
            for depth in 1..=4 {
                for &ordering in ORDERINGS.iter() {
                    let without = negamax(&state, depth, side, &mut evaluator, ordering, false);
                    let with = negamax(&state, depth, side, &mut evaluator, ordering, true);
                    assert_eq!(with.value, without.value, "{:?} depth {}", ordering, depth);
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn zero_sum_symmetry() -> Result<()> {
        let mut evaluator = HeuristicEvaluator::from(Heuristic::Default);
        for (state, _) in sample_positions()? {
            // at the horizon the two colours only differ in sign
            let ordering = MoveOrdering::Unordered;
            let white = negamax(&state, 0, Side::White, &mut evaluator, ordering, true);
            let black = negamax(&state, 0, Side::Black, &mut evaluator, ordering, true);
            assert_eq!(white.value, -black.value);

            // swapping the pieces and the player to move changes nothing
            for depth in 1..=3 {
                let mut solver = Solver::new(unlimited());
                let original = solver
                    .search(&state, Side::White, depth)
                    .map_err(|_| anyhow!("expired"))?;
                let mut solver = Solver::new(unlimited());
                let swapped = solver
                    .search(&state.swapped(), Side::Black, depth)
                    .map_err(|_| anyhow!("expired"))?;
                assert_eq!(original, swapped);
            }
        }
        Ok(())
    }

    #[test]
    pub fn shallow_wins_score_higher() -> Result<()> {
        assert!(win_score(3) > win_score(2));
        assert!(win_score(0) >= WIN_SCORE);

        let black = [(6, 6), (6, 4), (4, 6), (4, 4)];
        let one_move = position(&[(0, 0), (1, 0), (2, 0), (3, 1)], &black)?;
        let two_moves = position(&[(0, 0), (1, 0), (2, 0), (3, 2)], &black)?;

        let mut solver = Solver::new(unlimited());
        let near = solver.search(&one_move, Side::White, 3).map_err(|_| anyhow!("expired"))?;
        let far = solver.search(&two_moves, Side::White, 3).map_err(|_| anyhow!("expired"))?;

        assert_eq!(near.score, win_score(2));
        assert_eq!(near.best_move, Some("42N".parse()?));
        assert!(near.score > far.score);
        Ok(())
    }

    #[test]
    pub fn completes_three_in_a_row() -> Result<()> {
        init_logger();
        let state = three_in_a_row()?;
        let winning_move: Move = "64N".parse()?;

        for &ordering in ORDERINGS.iter() {
            let config = unlimited().with_ordering(ordering);
            let result = Solver::new(config).best_move(&state, Side::White);

            assert_eq!(result.best_move, Some(winning_move));
            assert!(result.score >= WIN_SCORE);
            // the win is found at depth 1 and nothing deeper is searched
            assert_eq!(result.depth, 1);
            assert!(!result.aborted);
            assert_eq!(result.stats.nodes, 2 + state.legal_moves(Side::White).len());
        }
        Ok(())
    }

    #[test]
    pub fn role_swap_mirrors_best_move() -> Result<()> {
        init_logger();
        let state = three_in_a_row()?;
        let mut evaluator = HeuristicEvaluator::from(Heuristic::Default);
        let score = heuristics::Evaluator::evaluate(&mut evaluator, &state);
        let swapped_score = heuristics::Evaluator::evaluate(&mut evaluator, &state.swapped());
        assert_eq!(swapped_score, -score);

        let config = unlimited().with_max_depth(3);
        let white = Solver::new(config.clone()).best_move(&state, Side::White);
        let black = Solver::new(config).best_move(&state.swapped(), Side::Black);
        assert_eq!(white.best_move, black.best_move);
        assert_eq!(white.score, black.score);

        // deeper entries left by earlier iterations may answer shallower
        // queries, and which ones survive depends on slot collisions
        for (state, side) in sample_positions()? {
            let config = unlimited().with_max_depth(4).with_transposition_table(false);
            let original = Solver::new(config.clone()).best_move(&state, side);
            let swapped = Solver::new(config).best_move(&state.swapped(), side.opponent());
            assert_eq!(original.best_move, swapped.best_move);
            assert_eq!(original.score, swapped.score);
        }
        Ok(())
    }

    #[test]
    pub fn zero_time_budget() {
        init_logger();
        let state = State::initial();
        let config = SearchConfig::default().with_time_limit(0.0);
        let result = Solver::new(config).best_move(&state, Side::White);

        assert_eq!(result.depth, 0);
        assert_eq!(result.stats.nodes, 1);
        let chosen = result.best_move.expect("a fallback move");
        assert!(state.legal_moves(Side::White).contains(&chosen));
    }

    #[test]
    pub fn zero_max_depth() {
        let state = midgame().unwrap();
        let config = unlimited().with_max_depth(0);
        let mut solver = Solver::new(config);
        let result = solver.best_move(&state, Side::Black);

        assert_eq!(result.stats.nodes, 0);
        assert_eq!(result.depth, 0);
        assert_eq!(result.score, solver.static_score(&state, Side::Black));
        assert!(result.best_move.is_some());
    }

    #[test]
    pub fn abort_before_first_search() {
        // the clock reads 0ms after depth 0, then 10ms at the root of depth 1
        let config = SearchConfig::default().with_time_limit(0.005);
        let mut solver = Solver::new(config).with_clock(TickClock::new(Duration::from_millis(10)));
        let state = State::initial();
        let result = solver.best_move(&state, Side::White);

        assert!(result.aborted);
        assert_eq!(result.depth, 0);
        assert_eq!(solver.clock().reads(), 2);
        assert!(solver.transposition_table().is_empty());
        let chosen = result.best_move.expect("a fallback move");
        assert!(state.legal_moves(Side::White).contains(&chosen));
    }

    #[test]
    pub fn abort_mid_search() -> Result<()> {
        init_logger();
        // reads: 0ms after depth 0, 10ms at the depth 1 root, 20ms after depth 1,
        // 30ms at the depth 2 root and 40ms at its first child, past the 35ms budget
        let config = SearchConfig::default()
            .with_time_limit(0.035)
            .with_table_size(1 << 16);
        let mut solver = Solver::new(config).with_clock(TickClock::new(Duration::from_millis(10)));
        let state = State::initial();
        let result = solver.best_move(&state, Side::White);

        assert!(result.aborted);
        assert_eq!(result.depth, 1);
        assert_eq!(solver.clock().reads(), 5);

        // only the completed depth reached the table
        let table = solver.transposition_table();
        assert_eq!(table.lookup(&state, Side::White, 1).map(|e| e.depth), Some(1));
        assert!(table.lookup(&state, Side::White, 2).is_none());

        // the move is the one the completed depth 1 search chose
        let mut reference = Solver::new(unlimited());
        let line = reference.search(&state, Side::White, 1).map_err(|_| anyhow!("expired"))?;
        assert_eq!(result.best_move, line.best_move);
        assert_eq!(result.score, line.score);
        Ok(())
    }

    #[test]
    pub fn tick_clock() {
        let mut clock = TickClock::new(Duration::from_millis(3));
        assert_eq!(clock.elapsed(), Duration::from_millis(0));
        assert_eq!(clock.elapsed(), Duration::from_millis(3));
        clock.reset();
        assert_eq!(clock.reads(), 0);
        assert_eq!(clock.elapsed(), Duration::from_millis(0));

        let mut system = SystemClock::new();
        system.reset();
        assert!(system.elapsed() < Duration::from_secs(60));
    }

    #[test]
    pub fn no_legal_moves() -> Result<()> {
        // White's only piece is boxed into the corner
        let state = position(&[(0, 0)], &[(1, 0), (0, 1), (6, 6)])?;
        assert!(state.legal_moves(Side::White).is_empty());

        let mut solver = Solver::new(unlimited().with_max_depth(4));
        let result = solver.best_move(&state, Side::White);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, solver.static_score(&state, Side::White));
        Ok(())
    }

    #[test]
    pub fn game_already_over() -> Result<()> {
        let state = three_in_a_row()?.apply("64N".parse()?)?;
        let result = Solver::new(unlimited()).best_move(&state, Side::White);
        assert_eq!(result.best_move, None);
        assert!(result.score >= WIN_SCORE);

        let result = Solver::new(unlimited()).best_move(&state, Side::Black);
        assert!(result.score <= -WIN_SCORE);
        Ok(())
    }

    #[test]
    pub fn random_ordering_is_reproducible() {
        let state = State::initial();
        let config = unlimited()
            .with_max_depth(4)
            .with_ordering(MoveOrdering::Random)
            .with_seed(1234);
        let first = Solver::new(config.clone()).best_move(&state, Side::White);
        let second = Solver::new(config).best_move(&state, Side::White);
        assert_eq!(first, second);
    }

    #[test]
    pub fn reuse_table_between_moves() -> Result<()> {
        let state = midgame()?;
        let mut config = unlimited().with_max_depth(4);
        config.reuse_table = true;
        let mut solver = Solver::new(config);

        let first = solver.best_move(&state, Side::Black);
        let stored = solver.transposition_table().len();
        assert!(stored > 0);

        // the same question again is answered from the table
        let second = solver.best_move(&state, Side::Black);
        assert_eq!(first.score, second.score);
        assert!(second.stats.nodes < first.stats.nodes);
        assert!(second.stats.table_hits > 0);
        Ok(())
    }

    #[test]
    pub fn free_function() -> Result<()> {
        let state = State::initial();
        let chosen = crate::best_move(
            &state,
            Side::Black,
            0.5,
            3,
            Heuristic::Default,
            MoveOrdering::HeuristicSorted,
        )
        .ok_or_else(|| anyhow!("no move found"))?;
        assert!(state.legal_moves(Side::Black).contains(&chosen));
        Ok(())
    }

    #[test]
    pub fn search_config() -> Result<()> {
        let config = SearchConfig::default();
        assert_eq!(config.time_limit, 19.0);
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.ordering, MoveOrdering::HeuristicSorted);
        assert_eq!(config.time_budget(), Some(Duration::from_secs(19)));

        let json = r#"{"ordering": "none", "time_limit": 2.5, "heuristic": "cluster"}"#;
        let parsed = SearchConfig::from_json(json)?;
        assert_eq!(parsed.ordering, MoveOrdering::Unordered);
        assert_eq!(parsed.heuristic, Heuristic::Cluster);
        assert_eq!(parsed.time_budget(), Some(Duration::from_millis(2500)));
        assert_eq!(parsed.max_depth, 100);

        assert_eq!(SearchConfig::from_json(&config.to_json()?)?, config);
        assert!(SearchConfig::from_json(r#"{"heuristic": "psychic"}"#).is_err());

        assert_eq!(config.clone().with_time_limit(f64::INFINITY).time_budget(), None);
        assert_eq!(config.clone().with_time_limit(-1.0).time_budget(), Some(Duration::ZERO));

        let missing = SearchConfig::load("no_such_profile.json").unwrap_err();
        assert!(format!("{:#}", missing).contains("no_such_profile.json"));
        Ok(())
    }

    #[test]
    pub fn ordering_node_counts() -> Result<()> {
        let state = midgame()?;
        let mut evaluator = HeuristicEvaluator::from(Heuristic::Default);
        let depth = 4;

        let exhaustive = minimax(&state, depth, Side::White, &mut evaluator);
        println!("Minimax: {} nodes, value {}", exhaustive.nodes, exhaustive.value);
        for &ordering in ORDERINGS.iter() {
            let start_time = Instant::now();
            let result = negamax(&state, depth, Side::White, &mut evaluator, ordering, true);
            let time = Instant::now() - start_time;
            println!(
                "Negamax {:?}: {} nodes, value {}, {:.3}ms",
                ordering,
                result.nodes,
                result.value,
                time.as_secs_f64() * 1000.0
            );
            assert_eq!(result.value, exhaustive.value);
        }
        Ok(())
    }
}
