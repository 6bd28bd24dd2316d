use anyhow::Result;
use linefleet_core::{
    AveragePolicy, Convoy, ConvoyLookup, CostCategory, Direction, JsonArchive, LineSettings,
    LineStatus, LineType, PlayerId, ProfitPolicy, Registry, StopId, WorldContext,
};
use linefleet_core::ledger::MAX_MONTHS;

fn context(profit_policy: ProfitPolicy) -> WorldContext {
    WorldContext::new(
        0,
        LineSettings {
            journey_time_window: 8,
            average_policy: AveragePolicy::CarryOver,
            profit_policy,
        },
    )
}

#[test]
fn bus_line_month_close_with_derived_profit() -> Result<()> {
    let ctx = context(ProfitPolicy::Derived);
    let mut registry = Registry::new();
    let line = registry.create_line(LineType::Bus, PlayerId(0), &ctx);
    let c1 = registry.insert_convoy(Convoy::new("C1", [0]));
    registry.assign_convoy(line, c1)?;

    registry.book(line, CostCategory::Revenue, 1000)?;
    registry.book(line, CostCategory::OperatingCost, -400)?;
    registry.month_end();

    let state = registry.line_checked(line)?;
    assert_eq!(state.finance_history(1, CostCategory::Revenue)?, 1000);
    assert_eq!(state.finance_history(1, CostCategory::OperatingCost)?, -400);
    assert_eq!(state.finance_history(1, CostCategory::Profit)?, 600);
    assert_eq!(state.finance_history(0, CostCategory::Revenue)?, 0);
    assert_eq!(state.status(), LineStatus::Healthy);
    Ok(())
}

#[test]
fn bus_line_month_close_with_booked_profit() -> Result<()> {
    let ctx = context(ProfitPolicy::Booked);
    let mut registry = Registry::new();
    let line = registry.create_line(LineType::Bus, PlayerId(0), &ctx);
    let c1 = registry.insert_convoy(Convoy::new("C1", [0]));
    registry.assign_convoy(line, c1)?;

    registry.book(line, CostCategory::Revenue, 1000)?;
    registry.book(line, CostCategory::OperatingCost, -400)?;
    registry.month_end();
    assert_eq!(
        registry.line_checked(line)?.finance_history(1, CostCategory::Profit)?,
        0
    );

    registry.book(line, CostCategory::Profit, -50)?;
    registry.month_end();
    let state = registry.line_checked(line)?;
    assert_eq!(state.finance_history(1, CostCategory::Profit)?, -50);
    assert_eq!(state.finance_history(2, CostCategory::Revenue)?, 1000);
    assert_eq!(state.status(), LineStatus::Unprofitable);
    Ok(())
}

#[test]
fn removing_the_only_convoy_empties_the_line() -> Result<()> {
    let ctx = context(ProfitPolicy::Derived);
    let mut registry = Registry::new();
    let line = registry.create_line(LineType::Tram, PlayerId(0), &ctx);
    let c1 = registry.insert_convoy(Convoy::new("C1", [0]));
    registry.assign_convoy(line, c1)?;
    assert_eq!(registry.recalc_status(line)?, LineStatus::Healthy);

    registry.release_convoy(line, c1)?;
    assert_eq!(registry.recalc_status(line)?, LineStatus::Empty);
    assert_eq!(registry.convoy(c1).and_then(Convoy::line), None);
    Ok(())
}

#[test]
fn empty_line_stays_empty_despite_losses() -> Result<()> {
    let ctx = context(ProfitPolicy::Derived);
    let mut registry = Registry::new();
    let line = registry.create_line(LineType::Ship, PlayerId(0), &ctx);
    registry.book(line, CostCategory::OperatingCost, -900)?;
    registry.month_end();
    assert_eq!(registry.recalc_status(line)?, LineStatus::Empty);
    Ok(())
}

#[test]
fn history_window_is_bounded() -> Result<()> {
    let ctx = context(ProfitPolicy::Derived);
    let mut registry = Registry::new();
    let line = registry.create_line(LineType::Air, PlayerId(0), &ctx);
    for month in 0..=MAX_MONTHS as i64 {
        registry.book(line, CostCategory::Distance, month + 1)?;
        registry.month_end();
    }
    let state = registry.line_checked(line)?;
    assert_eq!(state.finance_history(1, CostCategory::Distance)?, MAX_MONTHS as i64 + 1);
    assert_eq!(state.finance_history(MAX_MONTHS - 1, CostCategory::Distance)?, 3);
    assert!(state.finance_history(MAX_MONTHS, CostCategory::Distance).is_err());
    Ok(())
}

#[test]
fn shuttle_service_round_trips_through_an_archive() -> Result<()> {
    let ctx = context(ProfitPolicy::Derived);
    let mut registry = Registry::new();
    let mut schedule = LineType::NarrowGauge.create_schedule();
    schedule.set_stops(vec![StopId(10), StopId(11), StopId(12)]);
    schedule.set_mirrored(true);
    let line = registry.create_line_with_schedule(LineType::NarrowGauge, PlayerId(3), schedule, &ctx);
    let c1 = registry.insert_convoy(Convoy::new("C1", [0, 1]));
    registry.assign_convoy(line, c1)?;

    registry.record_leg(line, StopId(10), StopId(11), Direction::Forward, 90)?;
    registry.record_leg(line, StopId(11), StopId(12), Direction::Forward, 60)?;
    assert!(!registry.line_checked(line)?.is_alternating_circular_route());
    registry.record_leg(line, StopId(12), StopId(11), Direction::Reverse, 70)?;
    assert!(registry.line_checked(line)?.is_alternating_circular_route());

    registry.book(line, CostCategory::Comfort, 40)?;
    registry.book(line, CostCategory::Comfort, 45)?;
    registry.set_withdraw(line, true)?;

    let convoys = registry
        .convoys()
        .map(|(handle, convoy)| (linefleet_core::RawHandle::to_raw(handle), convoy.clone()))
        .collect();
    let mut archive = JsonArchive::new();
    registry.write_lines(&mut archive);
    let mut archive = JsonArchive::from_values(archive.into_values());
    let (restored, report) = Registry::restore(convoys, &mut archive, &ctx)?;
    assert!(report.is_clean());

    let original = registry.line_checked(line)?;
    let (_, copy) = restored.lines().next().expect("restored line");
    assert_eq!(copy.ledger(), original.ledger());
    assert_eq!(copy.finance_history(0, CostCategory::Comfort)?, 42);
    assert_eq!(copy.schedule().stops(), original.schedule().stops());
    assert!(copy.withdraw());
    assert!(copy.is_alternating_circular_route());
    assert_eq!(
        copy.average_journey_time(StopId(10), StopId(11), Direction::Forward),
        Some(90)
    );
    assert_eq!(copy.goods_categories(), original.goods_categories());
    Ok(())
}
