pub struct Settings {
    // Naming conventions of the runtime's macro-generated structs.
    pub string_struct_name: String,
    pub list_struct_prefix: String, // followed by '_' and the element tag
    pub dict_struct_prefix: String, // followed by '_', key tag, '_', value tag
    pub storage_qualifier: String, // stripped from the front of a type name before matching

    pub null_sentinel: String,
    pub max_list_children: usize,
    pub occupied_slot_status: i64,
    pub max_string_bytes: usize, // longer Str is cut to this many bytes

    // Limits for format_value().
    pub format_max_children: usize,
    pub format_max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self { Settings {
        string_struct_name: "__lang_rt_Str".to_string(),
        list_struct_prefix: "__lang_rt_List".to_string(),
        dict_struct_prefix: "__lang_rt_Dict".to_string(),
        storage_qualifier: "struct ".to_string(),

        null_sentinel: "None".to_string(),
        max_list_children: 200,
        occupied_slot_status: 1,
        max_string_bytes: 1 << 28,

        format_max_children: 20,
        format_max_depth: 4,
    } }
}
