/// Child combination for order-fixed (Q) nodes
///
/// Children are laid down left to right along the sequence, each one starting
/// right after the previous matched run or after a gap of deleted positions.
/// The reversed arrangement reads the children right to left, each on the
/// opposite strand. Both arrangements feed the same table and the best entry
/// per key survives. Reading the node itself on the opposite strand swaps the
/// two arrangements, so one table serves both contexts.
use crate::node_table::{
    extensions, offer_open_frontiers, relax, Cell, ChildSlot, Combiner, Context, Frontier, Layer,
    NodeTable, TableBuilder,
};

/// Table of an order-fixed node, valid in either context
pub(crate) fn combine_order_fixed(cx: &Combiner, slots: &[ChildSlot]) -> NodeTable {
    let mut builder = TableBuilder::default();

    let forward: Vec<&ChildSlot> = slots.iter().collect();
    sweep(cx, &forward, Context::Forward, &mut builder);

    let reversed: Vec<&ChildSlot> = slots.iter().rev().collect();
    sweep(cx, &reversed, Context::Reverse, &mut builder);

    builder.finish()
}

/// Concatenate `order` along the sequence with every child read in `child_context`
fn sweep(cx: &Combiner, order: &[&ChildSlot], child_context: Context, builder: &mut TableBuilder) {
    let mut layers: Vec<Layer> = Vec::with_capacity(order.len() + 1);

    let mut initial = Layer::new();
    initial.insert(
        Frontier::Empty { tree_deletions: 0 },
        Cell {
            score: 0.0,
            start: 0,
            back: None,
            steps: Vec::new(),
        },
    );
    layers.push(initial);

    for (index, slot) in order.iter().enumerate() {
        let mut next = Layer::new();
        for (&frontier, cell) in &layers[index] {
            for extension in extensions(cx, frontier, cell.start, slot, child_context) {
                relax(
                    &mut next,
                    extension.frontier,
                    Cell {
                        score: cell.score + extension.score_delta,
                        start: extension.start,
                        back: Some((index, frontier)),
                        steps: extension.steps,
                    },
                );
            }
        }
        if next.is_empty() {
            return;
        }
        layers.push(next);
    }

    offer_open_frontiers(builder, &layers, order.len(), child_context);
}
