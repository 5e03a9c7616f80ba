mod diff_of_a_single_commit;
mod compare_revision_with_head;
mod patch_of_a_single_commit;
