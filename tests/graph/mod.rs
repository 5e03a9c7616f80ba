mod graph_summaries_and_inferred_edges;
mod graph_tree_rendering;
