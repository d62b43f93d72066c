/// Child combination for order-free (P) nodes
///
/// Subset dynamic program: a state records which children have been placed
/// (matched or deleted) together with the frontier of the covered span. Each
/// transition places one more child to the right of the span. Since every
/// subset is visited, appending alone reaches every relative order of the
/// children's runs, so the span may end up in any arrangement of the children.
use crate::node_table::{
    extensions, offer_open_frontiers, relax, Cell, ChildSlot, Combiner, Context, Frontier, Layer,
    NodeTable, TableBuilder,
};

/// Largest number of children an order-free node may have.
pub const MAX_ORDER_FREE_CHILDREN: usize = 16;

/// Table of an order-free node read in `context`; all children share it
pub(crate) fn combine_order_free(cx: &Combiner, slots: &[ChildSlot], context: Context) -> NodeTable {
    debug_assert!(slots.len() <= MAX_ORDER_FREE_CHILDREN);

    let full = (1usize << slots.len()) - 1;
    let mut layers: Vec<Layer> = vec![Layer::new(); full + 1];
    layers[0].insert(
        Frontier::Empty { tree_deletions: 0 },
        Cell {
            score: 0.0,
            start: 0,
            back: None,
            steps: Vec::new(),
        },
    );

    for mask in 0..full {
        if layers[mask].is_empty() {
            continue;
        }

        let mut updates = Vec::new();
        for (&frontier, cell) in &layers[mask] {
            for (bit, slot) in slots.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    continue;
                }
                let target = mask | (1 << bit);
                for extension in extensions(cx, frontier, cell.start, slot, context) {
                    updates.push((
                        target,
                        extension.frontier,
                        Cell {
                            score: cell.score + extension.score_delta,
                            start: extension.start,
                            back: Some((mask, frontier)),
                            steps: extension.steps,
                        },
                    ));
                }
            }
        }

        for (target, frontier, cell) in updates {
            relax(&mut layers[target], frontier, cell);
        }
    }

    let mut builder = TableBuilder::default();
    offer_open_frontiers(&mut builder, &layers, full, context);
    builder.finish()
}
