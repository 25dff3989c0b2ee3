//! Sibling Ordering Integration Tests
//!
//! Positions of ordered node types stay dense and zero-based within every sibling set
//! across creates, moves, reparents and destroys.
//!
//! ## Test Coverage
//! - default positions for new children
//! - move_to_top / move_to_bottom / move_above / move_below
//! - gap closing on destroy
//! - reparenting out of one sibling set and into another

mod common;

use ancestry_core::services::TreeService;
use anyhow::Result;
use common::{child_layout, create, fetch, layout, memory_service, turso_service};

// =========================================================================
// Scenarios (backend-independent)
// =========================================================================

async fn default_positions(service: &TreeService) -> Result<()> {
    let root = create(service, "menu", "root", None).await?;
    create(service, "menu", "first", Some(&root)).await?;
    create(service, "menu", "second", Some(&root)).await?;
    create(service, "menu", "third", Some(&root)).await?;

    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("first", 0), ("second", 1), ("third", 2)])
    );
    Ok(())
}

async fn move_third_to_top(service: &TreeService) -> Result<()> {
    let root = create(service, "menu", "root", None).await?;
    create(service, "menu", "first", Some(&root)).await?;
    create(service, "menu", "second", Some(&root)).await?;
    let mut third = create(service, "menu", "third", Some(&root)).await?;

    service.move_to_top(&mut third).await?;

    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("third", 0), ("first", 1), ("second", 2)])
    );
    Ok(())
}

async fn move_first_to_bottom(service: &TreeService) -> Result<()> {
    let root = create(service, "menu", "root", None).await?;
    let mut first = create(service, "menu", "first", Some(&root)).await?;
    create(service, "menu", "second", Some(&root)).await?;
    create(service, "menu", "third", Some(&root)).await?;

    service.move_to_bottom(&mut first).await?;

    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("second", 0), ("third", 1), ("first", 2)])
    );
    assert!(service.ordering().is_at_bottom(&first).await?);
    Ok(())
}

async fn move_above_and_below(service: &TreeService) -> Result<()> {
    let root = create(service, "menu", "root", None).await?;
    let mut a = create(service, "menu", "a", Some(&root)).await?;
    let mut b = create(service, "menu", "b", Some(&root)).await?;
    create(service, "menu", "c", Some(&root)).await?;
    create(service, "menu", "d", Some(&root)).await?;

    // Moving down: a below c
    let c = fetch(service, "c").await?;
    service.move_below(&mut a, &c).await?;
    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("b", 0), ("c", 1), ("a", 2), ("d", 3)])
    );

    // Moving up: d above c
    let mut d = fetch(service, "d").await?;
    service.move_above(&mut d, &c).await?;
    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("b", 0), ("d", 1), ("c", 2), ("a", 3)])
    );

    // Moving down past several: b below a
    let a = fetch(service, "a").await?;
    service.move_below(&mut b, &a).await?;
    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("d", 0), ("c", 1), ("a", 2), ("b", 3)])
    );
    Ok(())
}

async fn destroy_closes_gap(service: &TreeService) -> Result<()> {
    let root = create(service, "menu", "root", None).await?;
    let first = create(service, "menu", "first", Some(&root)).await?;
    create(service, "menu", "second", Some(&root)).await?;
    create(service, "menu", "third", Some(&root)).await?;

    service.destroy(&first).await?;

    assert_eq!(
        child_layout(service, &root).await?,
        layout(&[("second", 0), ("third", 1)])
    );
    Ok(())
}

async fn reparent_closes_old_gap_and_appends(service: &TreeService) -> Result<()> {
    let old_parent = create(service, "menu", "old", None).await?;
    let new_parent = create(service, "menu", "new", None).await?;
    create(service, "menu", "a", Some(&old_parent)).await?;
    let mut b = create(service, "menu", "b", Some(&old_parent)).await?;
    create(service, "menu", "c", Some(&old_parent)).await?;
    create(service, "menu", "x", Some(&new_parent)).await?;

    service.move_to(&mut b, Some(&new_parent)).await?;

    assert_eq!(
        child_layout(service, &old_parent).await?,
        layout(&[("a", 0), ("c", 1)])
    );
    assert_eq!(
        child_layout(service, &new_parent).await?,
        layout(&[("x", 0), ("b", 1)])
    );
    Ok(())
}

async fn move_below_into_other_parent(service: &TreeService) -> Result<()> {
    let left = create(service, "menu", "left", None).await?;
    let right = create(service, "menu", "right", None).await?;
    create(service, "menu", "l0", Some(&left)).await?;
    let mut l1 = create(service, "menu", "l1", Some(&left)).await?;
    create(service, "menu", "l2", Some(&left)).await?;
    let r0 = create(service, "menu", "r0", Some(&right)).await?;
    create(service, "menu", "r1", Some(&right)).await?;

    service.move_below(&mut l1, &r0).await?;

    assert_eq!(
        child_layout(service, &left).await?,
        layout(&[("l0", 0), ("l2", 1)])
    );
    assert_eq!(
        child_layout(service, &right).await?,
        layout(&[("r0", 0), ("l1", 1), ("r1", 2)])
    );
    Ok(())
}

// =========================================================================
// MemoryStore
// =========================================================================

#[tokio::test]
async fn test_default_positions_memory() -> Result<()> {
    let (service, _store) = memory_service();
    default_positions(&service).await
}

#[tokio::test]
async fn test_move_third_to_top_memory() -> Result<()> {
    let (service, _store) = memory_service();
    move_third_to_top(&service).await
}

#[tokio::test]
async fn test_move_first_to_bottom_memory() -> Result<()> {
    let (service, _store) = memory_service();
    move_first_to_bottom(&service).await
}

#[tokio::test]
async fn test_move_above_and_below_memory() -> Result<()> {
    let (service, _store) = memory_service();
    move_above_and_below(&service).await
}

#[tokio::test]
async fn test_destroy_closes_gap_memory() -> Result<()> {
    let (service, _store) = memory_service();
    destroy_closes_gap(&service).await
}

#[tokio::test]
async fn test_reparent_closes_old_gap_and_appends_memory() -> Result<()> {
    let (service, _store) = memory_service();
    reparent_closes_old_gap_and_appends(&service).await
}

#[tokio::test]
async fn test_move_below_into_other_parent_memory() -> Result<()> {
    let (service, _store) = memory_service();
    move_below_into_other_parent(&service).await
}

// =========================================================================
// TursoStore
// =========================================================================

#[tokio::test]
async fn test_default_positions_turso() -> Result<()> {
    let (service, _temp) = turso_service().await?;
    default_positions(&service).await
}

#[tokio::test]
async fn test_move_third_to_top_turso() -> Result<()> {
    let (service, _temp) = turso_service().await?;
    move_third_to_top(&service).await
}

#[tokio::test]
async fn test_move_above_and_below_turso() -> Result<()> {
    let (service, _temp) = turso_service().await?;
    move_above_and_below(&service).await
}

#[tokio::test]
async fn test_destroy_closes_gap_turso() -> Result<()> {
    let (service, _temp) = turso_service().await?;
    destroy_closes_gap(&service).await
}

#[tokio::test]
async fn test_reparent_closes_old_gap_and_appends_turso() -> Result<()> {
    let (service, _temp) = turso_service().await?;
    reparent_closes_old_gap_and_appends(&service).await
}
