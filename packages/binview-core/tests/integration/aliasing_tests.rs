//! Overlapping and disjoint views over one buffer.

use anyhow::Result;
use ntest::timeout;
use serde_json::json;

use binview_core::view::{FieldView, RecordArray, RecordArrayMut, RecordBuf, View, ViewMut};

use super::helpers::layout;

#[timeout(1000)]
#[test]
fn test_overlapping_views_observe_writes() -> Result<()> {
    let layout = layout("vec3");
    let mut buffer = RecordArray::zeroed_buffer(&layout, 1)?;

    ViewMut::new(&layout, &mut buffer)?.set("y", &json!(4.5))?;

    let first = View::new(&layout, &buffer)?;
    let second = View::bind(&layout, &buffer, 0, layout.fixed_size())?;
    assert_eq!(first.get("y")?, json!(4.5));
    assert_eq!(second.get("y")?, json!(4.5));

    ViewMut::new(&layout, &mut buffer)?.set("y", &json!(-1.0))?;
    let first = View::new(&layout, &buffer)?;
    let second = View::new(&layout, &buffer)?;
    assert_eq!(first.get("y")?, json!(-1.0));
    assert_eq!(second.get("y")?, first.get("y")?);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_disjoint_views_are_isolated() -> Result<()> {
    let layout = layout("vec3");
    let mut buffer = RecordArray::zeroed_buffer(&layout, 8)?;

    {
        let array = RecordArrayMut::new(&layout, &mut buffer)?;
        let (mut left, mut right) = array.split_at_mut(4)?;
        for mut view in left.iter_mut() {
            view.set("x", &json!(1.0))?;
        }
        right.get_mut(0)?.set("x", &json!(2.0))?;
        assert_eq!(left.len(), 4);
        assert_eq!(right.len(), 4);
        assert_eq!(left.get(3)?.get("x")?, json!(1.0));
        assert_eq!(right.get(1)?.get("x")?, json!(0.0));
    }

    let array = RecordArray::new(&layout, &buffer)?;
    let xs: Vec<_> = array
        .iter()
        .map(|view| view.get("x"))
        .collect::<Result<_, _>>()?;
    assert_eq!(
        xs,
        vec![
            json!(1.0),
            json!(1.0),
            json!(1.0),
            json!(1.0),
            json!(2.0),
            json!(0.0),
            json!(0.0),
            json!(0.0)
        ]
    );
    Ok(())
}

#[timeout(2000)]
#[test]
fn test_disjoint_partitions_across_threads() -> Result<()> {
    let layout = layout("vec3");
    let mut buffer = RecordArray::zeroed_buffer(&layout, 64)?;

    {
        let array = RecordArrayMut::new(&layout, &mut buffer)?;
        let (low, high) = array.split_at_mut(32)?;
        std::thread::scope(|scope| {
            for (mut part, z) in [(low, 1.0), (high, 2.0)] {
                scope.spawn(move || {
                    for mut view in part.iter_mut() {
                        view.set("z", &json!(z)).unwrap();
                    }
                });
            }
        });
    }

    let array = RecordArray::new(&layout, &buffer)?;
    for (i, view) in array.iter().enumerate() {
        let expected = if i < 32 { 1.0 } else { 2.0 };
        assert_eq!(view.get_as::<f32>("z")?, expected);
    }
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_nested_view_isolated_from_outer_writes() -> Result<()> {
    let layout = layout("entity");
    let value = json!({
        "id": 1,
        "label": "beacon",
        "transform": {"position": {"x": 3.0, "y": 4.0, "z": 5.0}, "scale": 1.0},
        "state": {"visible": 0, "layer": 0, "team": 0},
        "history": [{"x": 0.0, "y": 0.0, "z": 0.0}, {"x": 0.0, "y": 0.0, "z": 0.0}]
    });
    let mut buffer = RecordArray::zeroed_buffer(&layout, 2)?;
    {
        let mut array = RecordArrayMut::new(&layout, &mut buffer)?;
        for mut view in array.iter_mut() {
            view.write_value(&value)?;
        }
    }

    let array = RecordArrayMut::new(&layout, &mut buffer)?;
    let (held, mut other) = array.split_at_mut(1)?;
    let record = held.get(0)?;
    let FieldView::Object(transform) = record.get_view("transform")? else {
        anyhow::bail!("transform is not an object view");
    };
    let FieldView::Object(position) = transform.get_view("position")? else {
        anyhow::bail!("position is not an object view");
    };
    let before = position.to_json()?;

    // Writes outside the nested view while it is alive
    other
        .get_mut(0)?
        .set("id", &json!(77))?
        .set("label", &json!("moved"))?
        .set("transform", &json!({"position": {"x": 9.0, "y": 9.0, "z": 9.0}, "scale": 2.0}))?;

    assert_eq!(position.to_json()?, before);
    assert_eq!(before, json!({"x": 3.0, "y": 4.0, "z": 5.0}));
    assert_eq!(position.len(), 12);
    assert_eq!(transform.get("scale")?, json!(1.0));
    assert_eq!(other.get(0)?.get("transform")?["scale"], json!(2.0));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_nested_view_borrows_record_bytes() -> Result<()> {
    let layout = layout("entity");
    let value = json!({
        "id": 1,
        "label": "beacon",
        "transform": {"position": {"x": 3.0, "y": 4.0, "z": 5.0}, "scale": 1.0},
        "state": {"visible": 0, "layer": 0, "team": 0},
        "history": [{"x": 0.0, "y": 0.0, "z": 0.0}, {"x": 0.0, "y": 0.0, "z": 0.0}]
    });
    let record = RecordBuf::from_value(layout, &value)?;
    let view = record.view();
    let FieldView::Object(transform) = view.get_view("transform")? else {
        anyhow::bail!("transform is not an object view");
    };
    let offset = layout_offset(&record, "transform");
    assert_eq!(
        transform.as_bytes().as_ptr(),
        record.as_bytes()[offset..].as_ptr()
    );
    Ok(())
}

fn layout_offset(record: &RecordBuf, field: &str) -> usize {
    record
        .layout()
        .field(field)
        .map(|f| f.offset)
        .unwrap_or_default()
}

#[timeout(1000)]
#[test]
fn test_nested_writer_only_touches_its_range() -> Result<()> {
    let layout = layout("entity");
    let mut buffer = RecordArray::zeroed_buffer(&layout, 1)?;
    let before = buffer.clone();

    {
        let mut view = ViewMut::new(&layout, &mut buffer)?;
        let mut transform = view.get_view_mut("transform")?;
        transform.set("scale", &json!(3.0))?;
    }

    let transform = layout.field("transform")?;
    let changed: Vec<usize> = buffer
        .iter()
        .zip(&before)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    assert!(!changed.is_empty());
    assert!(changed
        .iter()
        .all(|&i| i >= transform.offset && i < transform.end_offset()));
    Ok(())
}
