#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use generic_colgen::{ColgenError, Column, ColumnPool};

    fn unit_column(row: usize, coef: f64) -> Column {
        Column::new(0.0, 0.0, 1.0).unwrap().add_coefficient(row, coef)
    }

    fn scenario_pool() -> ColumnPool {
        let mut pool = ColumnPool::new();
        assert!(pool.add(unit_column(0, 1.0)));
        assert!(pool.add(unit_column(1, 1.0)));
        assert!(pool.add(unit_column(2, -1.0)));
        pool
    }

    #[test]
    fn sorted_by_reduced_cost() {
        let mut pool = scenario_pool();
        let sorted = pool.get_sorted(&[1.0, 10.0, 100.0], 0);

        assert_eq!(sorted.len(), 2);
        assert_eq!(sorted[0].index, 1);
        assert_eq!(sorted[0].reduced_cost, -10.0);
        assert_eq!(sorted[1].index, 0);
        assert_eq!(sorted[1].reduced_cost, -1.0);
    }

    #[test]
    fn sorted_respects_max_count() {
        let mut pool = scenario_pool();
        let sorted = pool.get_sorted(&[1.0, 10.0, 100.0], 1);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].index, 1);
    }

    #[test]
    fn fixed_to_zero_columns_are_not_sorted() {
        let mut pool = scenario_pool();
        pool.at_mut(0).fix(0).unwrap();
        pool.at_mut(1).fix(0).unwrap();

        assert_eq!(pool.size(), 3);
        assert_eq!(pool.allowed_size(), 1);
        assert!(pool.get_sorted(&[1.0, 10.0, 100.0], 0).is_empty());

        pool.at_mut(0).unfix();
        assert_eq!(pool.allowed_size(), 2);
        assert_eq!(pool.get_sorted(&[1.0, 10.0, 100.0], 0).len(), 1);
    }

    #[test]
    fn fix_real_valued_column_fails() {
        let mut column = unit_column(0, 1.0);
        column.set_integer(false).unwrap();

        assert!(matches!(column.fix(1), Err(ColgenError::FixRealValuedColumn)));
        assert!(!column.is_fixed());
        assert_eq!(column.lower_bound(), 0.0);
        assert_eq!(column.upper_bound(), 1.0);
    }

    #[test]
    fn fix_and_unfix() {
        let mut column = Column::new(2.0, 0.0, 5.0).unwrap().add_coefficient(0, 1.0);
        column.fix(3).unwrap();
        assert_eq!(column.lower_bound(), 3.0);
        assert_eq!(column.upper_bound(), 3.0);
        assert_eq!(column.solution_value, 3.0);
        assert!(matches!(column.set_integer(false), Err(ColgenError::RealValuedFixedColumn)));

        column.unfix();
        assert_eq!(column.lower_bound(), 0.0);
        assert_eq!(column.upper_bound(), 5.0);
        assert!(matches!(column.fix(-1), Err(ColgenError::NegativeFixValue(-1))));
    }

    #[test]
    fn inverted_bounds_fail() {
        assert!(matches!(
            Column::new(0.0, 2.0, 1.0),
            Err(ColgenError::InvertedBounds { .. })
        ));
        assert!(Column::new(0.0, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn duplicates() {
        let mut pool = ColumnPool::new();
        let column = |cost: f64, upper: f64, rows: [(usize, f64); 2]| {
            Column::new(cost, 0.0, upper).unwrap().with_coefficients(rows)
        };
        assert!(pool.add(column(1.0, 1.0, [(0, 1.0), (3, 1.0)])));
        // same pattern in another order and with another cost
        assert!(!pool.add(column(7.0, 2.0, [(3, 1.0), (0, 1.0)])));
        assert!(!pool.add(column(1.0, 1.0, [(0, 1.0), (3, 1.0)])));
        // zero coefficients are not part of the pattern
        assert!(!pool.add(
            Column::new(1.0, 0.0, 1.0)
                .unwrap()
                .with_coefficients([(0, 1.0), (2, 0.0), (3, 1.0)])
        ));
        assert!(pool.add(column(1.0, 1.0, [(0, 1.0), (3, 2.0)])));

        assert_eq!(pool.size(), 2);
        assert_eq!(pool.at(0).cost(), 1.0);
    }

    #[test]
    fn save_and_load_stream() {
        let mut pool = scenario_pool();
        pool.add(
            Column::new(3.5, 0.0, f64::INFINITY)
                .unwrap()
                .with_coefficients([(4, 2.0), (1, -1.0)]),
        );
        pool.at_mut(0).fix(1).unwrap();

        let mut data = Vec::new();
        pool.save_to_stream(&mut data).unwrap();
        let loaded = ColumnPool::load_from_stream(&mut Cursor::new(data)).unwrap();

        assert_eq!(loaded.size(), 4);
        for (original, loaded) in pool.iter().zip(loaded.iter()) {
            assert!(original == loaded);
            assert_eq!(original.cost(), loaded.cost());
        }
        // fix state is not persisted
        assert!(!loaded.at(0).is_fixed());
        assert_eq!(loaded.at(3).upper_bound(), f64::INFINITY);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.bin");

        let pool = scenario_pool();
        pool.save_to_file(&path).unwrap();
        let loaded = ColumnPool::load_from_file(&path).unwrap();
        assert_eq!(loaded.size(), pool.size());
    }

    #[test]
    fn load_rejects_wrong_tag() {
        let mut data = Vec::new();
        scenario_pool().save_to_stream(&mut data).unwrap();
        data[1] = b'X';

        assert!(matches!(
            ColumnPool::load_from_stream(&mut Cursor::new(data)),
            Err(ColgenError::CorruptPool(_))
        ));
    }

    #[test]
    fn load_rejects_truncated_stream() {
        let mut data = Vec::new();
        scenario_pool().save_to_stream(&mut data).unwrap();
        data.truncate(data.len() - 3);

        assert!(ColumnPool::load_from_stream(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn load_rejects_oversized_record() {
        let mut data = vec![10_u8];
        data.extend_from_slice(b"ColumnPool");
        data.push(0xFF);
        data.extend_from_slice(&(1_i64 << 60).to_le_bytes());
        data.extend_from_slice(&[0_u8; 32]);

        assert!(matches!(
            ColumnPool::load_from_stream(&mut Cursor::new(data)),
            Err(ColgenError::CorruptPool(_))
        ));
    }
}
