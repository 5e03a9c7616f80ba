mod concurrent_restores_on_one_root;
