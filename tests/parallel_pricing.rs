#[cfg(test)]
mod tests {
    use rand::Rng;

    use generic_colgen::{
        price_members_in_parallel, ColgenError, ColgenSettings, Column, FixInformation, FixSettings,
        MemberPricing, PricingContext, PricingSettings, SetPartitioningProblem, UI,
    };

    const MEMBERS: usize = 3;
    const CONSTRAINTS: usize = 2;

    struct NoPricing;

    impl MemberPricing for NoPricing {
        fn generate(
            &mut self,
            context: &mut PricingContext<'_>,
            duals: &[f64],
        ) -> generic_colgen::Result<()> {
            Ok(())
        }
    }

    // Member 2 ends up fixed to a single column.
    fn create_problem() -> SetPartitioningProblem<NoPricing> {
        let mut problem = SetPartitioningProblem::new(
            MEMBERS,
            CONSTRAINTS,
            ColgenSettings::default(),
            FixSettings::default(),
            UI::silent().get_sender(),
            NoPricing,
        )
        .unwrap();

        for c in 0..CONSTRAINTS {
            let column = Column::new(0.0, 0.0, 1.0)
                .unwrap()
                .with_coefficients([(2, 1.0), (MEMBERS + c, 1.0)])
                .with_solution_value(0.5);
            problem.add_column(column).unwrap();
        }
        let information = FixInformation {
            iteration: 10,
            objective_change: 0.0,
        };
        assert_eq!(problem.fix_using_columns(&information, &[0, 1]).unwrap(), 1);
        assert!(problem.member_fully_fixed(2));
        problem
    }

    fn price(
        problem: &mut SetPartitioningProblem<NoPricing>,
        num_threads: usize,
    ) -> generic_colgen::Result<usize> {
        let settings = PricingSettings { num_threads, seed: 17 };
        let duals = vec![1.0, 2.0, 3.0, 0.0, 0.0];
        let mut context = problem.pricing_context();
        let summary = price_members_in_parallel(&mut context, &duals, &settings, |input, rng| {
            let constraint_row = MEMBERS + input.member % CONSTRAINTS;
            let column = Column::new(rng.random::<f64>(), 0.0, 1.0)?
                .with_coefficients([(input.member, 1.0), (constraint_row, 1.0)]);
            Ok(vec![column])
        })?;
        assert_eq!(summary.priced_members, 2);
        Ok(summary.added_columns)
    }

    fn member_column_cost(problem: &SetPartitioningProblem<NoPricing>, member: usize) -> f64 {
        let columns = problem.partitioning().columns_for_member(member);
        assert_eq!(columns.len(), 1);
        problem.pool().at(columns[0]).cost()
    }

    #[test]
    fn fully_fixed_members_are_skipped() {
        let mut problem = create_problem();
        assert_eq!(price(&mut problem, 2).unwrap(), 2);

        assert_eq!(problem.pool().size(), 4);
        assert_eq!(problem.partitioning().columns_for_member(2), &[0, 1]);
        for member in 0..2 {
            let column = problem.partitioning().columns_for_member(member)[0];
            assert_eq!(problem.column_member(column), Some(member));
        }
    }

    #[test]
    fn results_do_not_depend_on_threads() {
        let mut sequential = create_problem();
        price(&mut sequential, 1).unwrap();
        let mut parallel = create_problem();
        price(&mut parallel, 4).unwrap();

        for member in 0..2 {
            assert_eq!(
                member_column_cost(&sequential, member),
                member_column_cost(&parallel, member)
            );
        }
        assert_ne!(member_column_cost(&sequential, 0), member_column_cost(&sequential, 1));
    }

    #[test]
    fn duplicate_columns_are_not_counted() {
        let mut problem = create_problem();
        assert_eq!(price(&mut problem, 2).unwrap(), 2);
        assert_eq!(price(&mut problem, 2).unwrap(), 0);
        assert_eq!(problem.pool().size(), 4);
    }

    #[test]
    fn first_error_is_returned() {
        let mut problem = create_problem();
        let duals = vec![0.0; MEMBERS + CONSTRAINTS];
        let settings = PricingSettings {
            num_threads: 2,
            seed: 0,
        };

        let mut context = problem.pricing_context();
        let result = price_members_in_parallel(&mut context, &duals, &settings, |input, rng| {
            if input.member == 1 {
                return Err(ColgenError::InvalidColumn("scripted".to_string()));
            }
            Ok(Vec::new())
        });
        assert!(matches!(result, Err(ColgenError::InvalidColumn(_))));
    }

    #[test]
    fn invalid_generated_columns_fail() {
        let mut problem = create_problem();
        let duals = vec![0.0; MEMBERS + CONSTRAINTS];

        let result = price_members_in_parallel(
            &mut problem.pricing_context(),
            &duals,
            &PricingSettings::default(),
            |input, rng| Ok(vec![Column::new(0.0, 0.0, 2.0)?.add_coefficient(input.member, 1.0)]),
        );
        assert!(matches!(result, Err(ColgenError::InvalidColumn(_))));
    }

    #[cfg(feature = "highs")]
    mod highs {
        use generic_colgen::solvers::highs::HighsSolver;
        use generic_colgen::{
            price_members_in_parallel, ColgenSettings, Column, FixSettings, MemberPricing,
            PricingContext, PricingSettings, SetPartitioningProblem, StopReason, UI,
        };

        // Member p covers constraint c at costs[p][c]. Every subset of the
        // constraints is a possible column.
        struct AssignmentPricing {
            costs: Vec<Vec<f64>>,
            settings: PricingSettings,
        }

        impl MemberPricing for AssignmentPricing {
            fn generate(
                &mut self,
                context: &mut PricingContext<'_>,
                duals: &[f64],
            ) -> generic_colgen::Result<()> {
                let members = context.number_of_members();
                let constraints = context.number_of_constraints();
                let costs = &self.costs;

                price_members_in_parallel(context, duals, &self.settings, |input, rng| {
                    let mut columns = Vec::new();
                    for subset in 0..(1_usize << constraints) {
                        let covered: Vec<usize> =
                            (0..constraints).filter(|c| subset & (1 << c) != 0).collect();
                        let allowed = input.fixes.iter().enumerate().all(|(c, fix)| match fix {
                            Some(true) => covered.contains(&c),
                            Some(false) => !covered.contains(&c),
                            None => true,
                        });
                        if !allowed {
                            continue;
                        }

                        let cost: f64 = covered.iter().map(|&c| costs[input.member][c]).sum();
                        let reduced_cost = cost
                            - input.duals[input.member]
                            - covered.iter().map(|&c| input.duals[members + c]).sum::<f64>();
                        if reduced_cost < -1e-9 {
                            columns.push(
                                Column::new(cost, 0.0, 1.0)?
                                    .add_coefficient(input.member, 1.0)
                                    .with_coefficients(covered.iter().map(|&c| (members + c, 1.0))),
                            );
                        }
                    }
                    Ok(columns)
                })?;
                Ok(())
            }
        }

        #[test]
        fn assignment() {
            let costs = vec![vec![1.0, 5.0, 5.0], vec![5.0, 1.0, 5.0], vec![5.0, 5.0, 1.0]];
            let pricing = AssignmentPricing {
                costs,
                settings: PricingSettings {
                    num_threads: 2,
                    seed: 3,
                },
            };
            let mut problem = SetPartitioningProblem::new(
                3,
                3,
                ColgenSettings::default(),
                FixSettings::default(),
                UI::silent().get_sender(),
                pricing,
            )
            .unwrap();
            for c in 0..3 {
                problem.initialize_constraint(c, 1.0, 1.0, 100.0, 100.0, 0.0, 0.0).unwrap();
            }
            // every member starts with the empty column
            for member in 0..3 {
                problem
                    .add_column(Column::new(0.0, 0.0, 1.0).unwrap().add_coefficient(member, 1.0))
                    .unwrap();
            }

            let outcome = problem.solve(&mut HighsSolver::new()).unwrap();
            assert!(matches!(
                outcome.status,
                StopReason::IntegerSolution | StopReason::FixingComplete
            ));
            assert!((outcome.objective - 3.0).abs() < 1e-6);

            let value = problem.integral_solution_value().unwrap();
            assert!((value - 3.0).abs() < 1e-6);
            for (member, &column) in problem.rounded_solution().iter().enumerate() {
                let rows: Vec<usize> =
                    problem.pool().at(column).rows().iter().map(|e| e.row).collect();
                assert_eq!(rows, vec![member, 3 + member]);
            }
        }
    }
}
