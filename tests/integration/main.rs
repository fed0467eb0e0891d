mod fixtures;

#[cfg(test)]
mod case3_substituted_default;
#[cfg(test)]
mod case4_create_mono_branch;
#[cfg(test)]
mod config_errors;
#[cfg(test)]
mod dump_template;
#[cfg(test)]
mod meta_only_branch;
#[cfg(test)]
mod nested_submodule;
#[cfg(test)]
mod report_branches;
#[cfg(test)]
mod squash_pass;
