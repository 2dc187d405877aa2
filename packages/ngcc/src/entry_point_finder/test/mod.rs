mod directory_walker_entry_point_finder_spec;
